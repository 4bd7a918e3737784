use axum::{
    routing::{get, patch, post},
    Router,
};
use tower_sessions::Session;

use crate::errors::{AppError, AppResult};
use crate::middleware::SESSION_KEY;
use crate::models::SessionUser;
use crate::state::AppState;

mod auth;
mod jobs;
mod user;

pub use auth::{login, logout, me, register};
pub use jobs::{create_job, job_detail, list_jobs, update_status};
pub use user::{update_password, update_profile};

/// The JSON API surface. Layers (sessions, auth guard, body limits) are
/// applied by the caller.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/api/register", post(register))
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/user", get(me))
        .route("/api/jobs", get(list_jobs).post(create_job))
        .route("/api/jobs/:id", get(job_detail))
        .route("/api/jobs/:id/status", patch(update_status))
        .route("/api/user/profile", patch(update_profile))
        .route("/api/user/password", patch(update_password))
}

/// Reads the authenticated identity out of the session. The middleware has
/// already rejected unauthenticated API requests, but handlers still go
/// through this to get the identity itself.
pub(crate) async fn current_user(session: &Session) -> AppResult<SessionUser> {
    session
        .get::<SessionUser>(SESSION_KEY)
        .await
        .map_err(|e| AppError::Internal(format!("Session error: {}", e)))?
        .ok_or_else(|| AppError::Unauthorized("Not authenticated".into()))
}
