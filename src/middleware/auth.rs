use axum::{
    body::Body,
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;

use crate::errors::AppError;
use crate::models::SessionUser;

/// Session key holding the authenticated identity.
pub const SESSION_KEY: &str = "user";

/// Guards the API surface. Register and login are open; everything else
/// under /api requires a session. Paths outside /api (the uploaded blobs)
/// pass through; holders of a blob handle can fetch it without a session.
pub async fn require_auth(session: Session, req: Request<Body>, next: Next) -> Response {
    let path = req.uri().path();

    if !path.starts_with("/api") || path == "/api/register" || path == "/api/login" {
        return next.run(req).await;
    }

    match session.get::<SessionUser>(SESSION_KEY).await {
        Ok(Some(_)) => next.run(req).await,
        Ok(None) => AppError::Unauthorized("Not authenticated".into()).into_response(),
        Err(e) => {
            tracing::error!("Session error: {}", e);
            AppError::Unauthorized("Not authenticated".into()).into_response()
        }
    }
}
