use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use tower_sessions::Session;

use crate::errors::{AppError, AppResult};
use crate::handlers::current_user;
use crate::middleware::SESSION_KEY;
use crate::models::{LoginForm, NewUser, PublicUser, RegisterForm, Role, SessionUser, User};
use crate::services::{hash_password, verify_password};
use crate::state::AppState;

async fn establish_session(session: &Session, user: &User) -> AppResult<()> {
    session
        .insert(SESSION_KEY, SessionUser::from(user))
        .await
        .map_err(|e| AppError::Internal(format!("Session error: {}", e)))
}

/// POST /api/register. Role is always student; staff accounts are seeded,
/// never self-registered. A successful registration logs the user in.
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<RegisterForm>,
) -> AppResult<Response> {
    tracing::info!("Register attempt for username: {}", form.username);

    let username = form.username.trim().to_string();
    if username.is_empty() || form.password.is_empty() {
        return Err(AppError::Validation("Username and password are required".into()));
    }

    let password_hash = hash_password(&form.password)?;
    let user = state
        .storage
        .create_user(NewUser {
            username,
            password_hash,
            name: form.name,
            phone: form.phone,
            role: Role::Student,
        })
        .await?;

    establish_session(&session, &user).await?;
    tracing::info!("User created successfully: {}", user.username);
    Ok((StatusCode::CREATED, Json(PublicUser::from(&user))).into_response())
}

/// POST /api/login.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<LoginForm>,
) -> AppResult<Response> {
    tracing::info!("Login attempt for username: {}", form.username);

    let user = state
        .storage
        .get_user_by_username(&form.username)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid username or password".into()))?;

    if !verify_password(&form.password, &user.password_hash)? {
        tracing::info!("Login failed for {}: invalid password", form.username);
        return Err(AppError::Unauthorized("Invalid username or password".into()));
    }

    establish_session(&session, &user).await?;
    tracing::info!("Login successful for: {}", user.username);
    Ok(Json(PublicUser::from(&user)).into_response())
}

/// POST /api/logout.
pub async fn logout(session: Session) -> AppResult<Response> {
    session
        .flush()
        .await
        .map_err(|e| AppError::Internal(format!("Session error: {}", e)))?;
    Ok(Json(json!({ "message": "Logged out successfully" })).into_response())
}

/// GET /api/user. The current identity, fetched fresh from the store.
pub async fn me(State(state): State<AppState>, session: Session) -> AppResult<Response> {
    let identity = current_user(&session).await?;
    let user = state
        .storage
        .get_user(&identity.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Not authenticated".into()))?;
    Ok(Json(PublicUser::from(&user)).into_response())
}
