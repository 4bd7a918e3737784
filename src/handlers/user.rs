use axum::{
    extract::State,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use tower_sessions::Session;

use crate::errors::{AppError, AppResult};
use crate::handlers::current_user;
use crate::models::{PasswordForm, ProfileForm, PublicUser, UserUpdate};
use crate::services::{hash_password, verify_password};
use crate::state::AppState;

/// PATCH /api/user/profile. Name and phone only; username and role are
/// immutable after registration.
pub async fn update_profile(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<ProfileForm>,
) -> AppResult<Response> {
    let identity = current_user(&session).await?;
    let user = state
        .storage
        .update_user(
            &identity.id,
            UserUpdate {
                name: Some(form.name),
                phone: Some(form.phone),
                password_hash: None,
            },
        )
        .await?;
    tracing::info!("Profile updated for {}", user.username);
    Ok(Json(PublicUser::from(&user)).into_response())
}

/// PATCH /api/user/password. Requires the current password to match.
pub async fn update_password(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<PasswordForm>,
) -> AppResult<Response> {
    let identity = current_user(&session).await?;
    let user = state
        .storage
        .get_user(&identity.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    if !verify_password(&form.current_password, &user.password_hash)? {
        return Err(AppError::Validation("Current password is incorrect".into()));
    }

    let password_hash = hash_password(&form.new_password)?;
    state
        .storage
        .update_user(
            &identity.id,
            UserUpdate {
                password_hash: Some(password_hash),
                ..Default::default()
            },
        )
        .await?;

    tracing::info!("Password updated for {}", user.username);
    Ok(Json(json!({ "message": "Password updated successfully" })).into_response())
}
