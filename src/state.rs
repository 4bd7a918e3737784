use std::sync::Arc;

use crate::config::Config;
use crate::services::JobService;
use crate::storage::Storage;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub jobs: JobService,
    pub config: Config,
}

impl AppState {
    pub fn new(storage: Arc<dyn Storage>, config: Config) -> Self {
        Self {
            jobs: JobService::new(storage.clone()),
            storage,
            config,
        }
    }
}
