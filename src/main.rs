mod config;
mod errors;
mod handlers;
mod middleware;
mod models;
mod seed;
mod services;
mod state;
mod storage;

use axum::{extract::DefaultBodyLimit, middleware::from_fn};
use tower_http::{limit::RequestBodyLimitLayer, services::ServeDir};
use tower_sessions::{cookie::SameSite, MemoryStore, SessionManagerLayer};

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::load()?;

    // The upload directory must exist before the first submission lands.
    tokio::fs::create_dir_all(&config.upload.dir).await?;

    // Backend picked once at startup: Redis when reachable, in-memory
    // fallback otherwise.
    let storage = storage::connect(&config).await;
    if config.seed.demo_accounts {
        seed::seed_demo_accounts(storage.as_ref()).await?;
    }

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(config.session.secure)
        .with_same_site(SameSite::Lax)
        .with_name(config.session.cookie_name.clone());

    let state = AppState::new(storage, config.clone());

    let app = handlers::api_router()
        // Uploaded blobs are served statically by their opaque handle; no
        // per-blob ownership check happens on this path.
        .nest_service("/uploads", ServeDir::new(&config.upload.dir))
        .layer(from_fn(middleware::require_auth))
        .layer(session_layer)
        // The request body cap from config replaces axum's default limit.
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.upload.max_file_size))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(format!(
        "{}:{}",
        config.server.host, config.server.port
    ))
    .await?;
    tracing::info!("Server running on {}:{}", config.server.host, config.server.port);

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
