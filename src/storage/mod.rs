use std::sync::Arc;

use async_trait::async_trait;

use crate::config::Config;
use crate::errors::AppResult;
use crate::models::{JobRecord, JobStatus, NewPrintJob, NewUser, PrintJob, User, UserUpdate};

mod memory;
mod redis_store;

pub use memory::MemoryStorage;
pub use redis_store::RedisStorage;

/// Persistence seam for users and print jobs. The engine and handlers only
/// ever see `Arc<dyn Storage>`; which backend sits behind it is decided once
/// at startup by [`connect`].
#[async_trait]
pub trait Storage: Send + Sync {
    async fn create_user(&self, new: NewUser) -> AppResult<User>;
    async fn get_user(&self, id: &str) -> AppResult<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> AppResult<Option<User>>;
    async fn update_user(&self, id: &str, updates: UserUpdate) -> AppResult<User>;

    /// Assigns the queue number, computes the estimate, stamps the creation
    /// time, and stores the job with status `pending`.
    async fn create_print_job(&self, new: NewPrintJob) -> AppResult<PrintJob>;
    async fn get_print_jobs(&self) -> AppResult<Vec<JobRecord>>;
    async fn get_print_jobs_by_user(&self, owner_id: &str) -> AppResult<Vec<JobRecord>>;
    async fn get_print_job(&self, id: &str) -> AppResult<Option<PrintJob>>;
    async fn update_print_job_status(&self, id: &str, status: JobStatus) -> AppResult<PrintJob>;
}

/// Picks the storage backend: Redis when reachable, otherwise the in-memory
/// fallback. The choice is made once; nothing re-checks connectivity per
/// call.
pub async fn connect(config: &Config) -> Arc<dyn Storage> {
    match RedisStorage::connect(&config.redis.url).await {
        Ok(store) => {
            tracing::info!("Connected to Redis at {}", config.redis.url);
            Arc::new(store)
        }
        Err(e) => {
            tracing::warn!(
                "Redis unavailable ({}); running with memory storage - data will not persist",
                e
            );
            Arc::new(MemoryStorage::new())
        }
    }
}

/// Listing order shared by both backends: newest creation first, queue
/// number as the tie-breaker for jobs stamped in the same instant.
pub(crate) fn sort_newest_first(records: &mut [JobRecord]) {
    records.sort_by(|a, b| {
        b.job
            .created_at
            .cmp(&a.job.created_at)
            .then(b.job.queue_number.cmp(&a.job.queue_number))
    });
}
