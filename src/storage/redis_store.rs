use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use redis::{AsyncCommands, Client};

use crate::errors::{AppError, AppResult};
use crate::models::{
    estimate_minutes, JobRecord, JobStatus, NewPrintJob, NewUser, OwnerSummary, PrintJob, User,
    UserUpdate,
};
use crate::storage::{sort_newest_first, Storage};

const QUEUE_COUNTER_KEY: &str = "jobs:queue_counter";
const JOBS_INDEX_KEY: &str = "jobs:index";

fn user_key(id: &str) -> String {
    format!("user:{}", id)
}

fn username_key(username: &str) -> String {
    format!("username:{}", username)
}

fn job_key(id: &str) -> String {
    format!("job:{}", id)
}

/// Durable store. Users and jobs are JSON values under `user:{id}` and
/// `job:{id}`; `username:{name}` maps usernames to ids and doubles as the
/// uniqueness guard (SET NX); `jobs:index` preserves creation order and the
/// queue counter is a Redis INCR, so assignment is linearizable.
pub struct RedisStorage {
    client: Arc<Client>,
}

impl RedisStorage {
    /// Opens the client and verifies the server is reachable with a PING.
    pub async fn connect(url: &str) -> Result<Self, redis::RedisError> {
        let client = Client::open(url)?;
        let mut conn = client.get_async_connection().await?;
        redis::cmd("PING").query_async::<_, String>(&mut conn).await?;
        Ok(Self {
            client: Arc::new(client),
        })
    }

    async fn conn(&self) -> Result<redis::aio::Connection, redis::RedisError> {
        self.client.get_async_connection().await
    }

    async fn load_jobs(&self) -> AppResult<Vec<PrintJob>> {
        let mut conn = self.conn().await?;
        let ids: Vec<String> = conn.lrange(JOBS_INDEX_KEY, 0, -1).await?;
        let mut jobs = Vec::with_capacity(ids.len());
        for id in ids {
            let raw: Option<String> = conn.get(job_key(&id)).await?;
            match raw {
                Some(data) => jobs.push(serde_json::from_str(&data)?),
                None => tracing::warn!("Job {} listed in index but missing", id),
            }
        }
        Ok(jobs)
    }

    /// Resolves owner display info for a batch of jobs, fetching each owner
    /// at most once.
    async fn annotate(&self, jobs: Vec<PrintJob>) -> AppResult<Vec<JobRecord>> {
        let mut owners: HashMap<String, OwnerSummary> = HashMap::new();
        let mut records = Vec::with_capacity(jobs.len());
        for job in jobs {
            if !owners.contains_key(&job.owner_id) {
                let summary = self
                    .get_user(&job.owner_id)
                    .await?
                    .map(|u| OwnerSummary::from(&u))
                    .unwrap_or_else(OwnerSummary::unknown);
                owners.insert(job.owner_id.clone(), summary);
            }
            let user = owners[&job.owner_id].clone();
            records.push(JobRecord { job, user });
        }
        Ok(records)
    }
}

#[async_trait]
impl Storage for RedisStorage {
    async fn create_user(&self, new: NewUser) -> AppResult<User> {
        let mut conn = self.conn().await?;
        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            username: new.username,
            password_hash: new.password_hash,
            name: new.name,
            phone: new.phone,
            role: new.role,
        };
        // SET NX on the username key is the uniqueness guard; the loser of
        // a race sees `false` here.
        let claimed: bool = conn.set_nx(username_key(&user.username), &user.id).await?;
        if !claimed {
            return Err(AppError::Conflict("Username already exists".into()));
        }
        let _: () = conn
            .set(user_key(&user.id), serde_json::to_string(&user)?)
            .await?;
        Ok(user)
    }

    async fn get_user(&self, id: &str) -> AppResult<Option<User>> {
        let mut conn = self.conn().await?;
        let raw: Option<String> = conn.get(user_key(id)).await?;
        raw.map(|data| serde_json::from_str(&data).map_err(AppError::from))
            .transpose()
    }

    async fn get_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let mut conn = self.conn().await?;
        let id: Option<String> = conn.get(username_key(username)).await?;
        match id {
            Some(id) => self.get_user(&id).await,
            None => Ok(None),
        }
    }

    async fn update_user(&self, id: &str, updates: UserUpdate) -> AppResult<User> {
        let mut user = self
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;
        if let Some(name) = updates.name {
            user.name = name;
        }
        if let Some(phone) = updates.phone {
            user.phone = phone;
        }
        if let Some(password_hash) = updates.password_hash {
            user.password_hash = password_hash;
        }
        let mut conn = self.conn().await?;
        let _: () = conn
            .set(user_key(&user.id), serde_json::to_string(&user)?)
            .await?;
        Ok(user)
    }

    async fn create_print_job(&self, new: NewPrintJob) -> AppResult<PrintJob> {
        if new.copies < 1 {
            return Err(AppError::Validation("Copies must be at least 1".into()));
        }
        let mut conn = self.conn().await?;
        // INCR hands out each queue number exactly once, regardless of how
        // many submissions race.
        let queue_number: u32 = conn.incr(QUEUE_COUNTER_KEY, 1u32).await?;
        let job = PrintJob {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: new.owner_id,
            file_name: new.file_name,
            file_handle: new.file_handle,
            copies: new.copies,
            print_type: new.print_type,
            status: JobStatus::Pending,
            queue_number,
            estimated_minutes: estimate_minutes(new.copies),
            created_at: Utc::now(),
        };
        let _: () = conn.set(job_key(&job.id), serde_json::to_string(&job)?).await?;
        let _: () = conn.rpush(JOBS_INDEX_KEY, &job.id).await?;
        Ok(job)
    }

    async fn get_print_jobs(&self) -> AppResult<Vec<JobRecord>> {
        let jobs = self.load_jobs().await?;
        let mut records = self.annotate(jobs).await?;
        sort_newest_first(&mut records);
        Ok(records)
    }

    async fn get_print_jobs_by_user(&self, owner_id: &str) -> AppResult<Vec<JobRecord>> {
        let jobs = self
            .load_jobs()
            .await?
            .into_iter()
            .filter(|j| j.owner_id == owner_id)
            .collect();
        let mut records = self.annotate(jobs).await?;
        sort_newest_first(&mut records);
        Ok(records)
    }

    async fn get_print_job(&self, id: &str) -> AppResult<Option<PrintJob>> {
        let mut conn = self.conn().await?;
        let raw: Option<String> = conn.get(job_key(id)).await?;
        raw.map(|data| serde_json::from_str(&data).map_err(AppError::from))
            .transpose()
    }

    async fn update_print_job_status(&self, id: &str, status: JobStatus) -> AppResult<PrintJob> {
        let mut job = self
            .get_print_job(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Job not found".into()))?;
        job.status = status;
        let mut conn = self.conn().await?;
        let _: () = conn.set(job_key(&job.id), serde_json::to_string(&job)?).await?;
        Ok(job)
    }
}
