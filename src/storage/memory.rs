use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::errors::{AppError, AppResult};
use crate::models::{
    estimate_minutes, JobRecord, JobStatus, NewPrintJob, NewUser, OwnerSummary, PrintJob, User,
    UserUpdate,
};
use crate::storage::{sort_newest_first, Storage};

/// Fallback store used when Redis is unreachable at startup. Everything
/// lives behind a single RwLock, so queue-number assignment and insertion
/// happen under one write guard.
pub struct MemoryStorage {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    jobs: Vec<PrintJob>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    fn annotate(&self, job: &PrintJob) -> JobRecord {
        let owner = self
            .users
            .iter()
            .find(|u| u.id == job.owner_id)
            .map(OwnerSummary::from)
            .unwrap_or_else(OwnerSummary::unknown);
        JobRecord {
            job: job.clone(),
            user: owner,
        }
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn create_user(&self, new: NewUser) -> AppResult<User> {
        let mut inner = self.inner.write().await;
        if inner.users.iter().any(|u| u.username == new.username) {
            return Err(AppError::Conflict("Username already exists".into()));
        }
        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            username: new.username,
            password_hash: new.password_hash,
            name: new.name,
            phone: new.phone,
            role: new.role,
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: &str) -> AppResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.username == username).cloned())
    }

    async fn update_user(&self, id: &str, updates: UserUpdate) -> AppResult<User> {
        let mut inner = self.inner.write().await;
        let user = inner
            .users
            .iter_mut()
            .find(|u| u.id == id)
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
        Ok(user.clone())
    }

    async fn create_print_job(&self, new: NewPrintJob) -> AppResult<PrintJob> {
        if new.copies < 1 {
            return Err(AppError::Validation("Copies must be at least 1".into()));
        }
        // Count-and-append under one write guard keeps the assignment
        // linearizable: concurrent submissions cannot observe the same
        // length.
        let mut inner = self.inner.write().await;
        let queue_number = (inner.jobs.len() + 1) as u32;
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
        inner.jobs.push(job.clone());
        Ok(job)
    }

    async fn get_print_jobs(&self) -> AppResult<Vec<JobRecord>> {
        let inner = self.inner.read().await;
        let mut records: Vec<JobRecord> = inner.jobs.iter().map(|j| inner.annotate(j)).collect();
        sort_newest_first(&mut records);
        Ok(records)
    }

    async fn get_print_jobs_by_user(&self, owner_id: &str) -> AppResult<Vec<JobRecord>> {
        let inner = self.inner.read().await;
        let mut records: Vec<JobRecord> = inner
            .jobs
            .iter()
            .filter(|j| j.owner_id == owner_id)
            .map(|j| inner.annotate(j))
            .collect();
        sort_newest_first(&mut records);
        Ok(records)
    }

    async fn get_print_job(&self, id: &str) -> AppResult<Option<PrintJob>> {
        let inner = self.inner.read().await;
        Ok(inner.jobs.iter().find(|j| j.id == id).cloned())
    }

    async fn update_print_job_status(&self, id: &str, status: JobStatus) -> AppResult<PrintJob> {
        let mut inner = self.inner.write().await;
        let job = inner
            .jobs
            .iter_mut()
            .find(|j| j.id == id)
            .ok_or_else(|| AppError::NotFound("Job not found".into()))?;
        job.status = status;
        Ok(job.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::models::{PrintType, Role};

    fn new_user(username: &str, role: Role) -> NewUser {
        NewUser {
            username: username.into(),
            password_hash: "hash".into(),
            name: username.to_uppercase(),
            phone: None,
            role,
        }
    }

    fn new_job(owner_id: &str, copies: u32) -> NewPrintJob {
        NewPrintJob {
            owner_id: owner_id.into(),
            file_name: "notes.pdf".into(),
            file_handle: format!("{}.pdf", uuid::Uuid::new_v4()),
            copies,
            print_type: PrintType::Bw,
        }
    }

    #[tokio::test]
    async fn duplicate_username_conflicts_and_first_user_survives() {
        let store = MemoryStorage::new();
        let first = store.create_user(new_user("alice", Role::Student)).await.unwrap();

        let err = store
            .create_user(new_user("alice", Role::Student))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let found = store.get_user_by_username("alice").await.unwrap().unwrap();
        assert_eq!(found.id, first.id);
    }

    #[tokio::test]
    async fn job_creation_assigns_sequential_queue_numbers() {
        let store = MemoryStorage::new();
        let owner = store.create_user(new_user("bob", Role::Student)).await.unwrap();

        for expected in 1..=5u32 {
            let job = store.create_print_job(new_job(&owner.id, 2)).await.unwrap();
            assert_eq!(job.queue_number, expected);
            assert_eq!(job.status, JobStatus::Pending);
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_submissions_get_unique_gapless_queue_numbers() {
        let store = Arc::new(MemoryStorage::new());
        let owner = store.create_user(new_user("carol", Role::Student)).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..32 {
            let store = store.clone();
            let owner_id = owner.id.clone();
            handles.push(tokio::spawn(async move {
                store.create_print_job(new_job(&owner_id, 1)).await.unwrap().queue_number
            }));
        }

        let mut numbers = Vec::new();
        for handle in handles {
            numbers.push(handle.await.unwrap());
        }
        numbers.sort_unstable();
        assert_eq!(numbers, (1..=32).collect::<Vec<u32>>());
    }

    #[tokio::test]
    async fn zero_copies_is_rejected() {
        let store = MemoryStorage::new();
        let err = store.create_print_job(new_job("u1", 0)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn listing_is_scoped_by_owner_and_annotated() {
        let store = MemoryStorage::new();
        let alice = store.create_user(new_user("alice", Role::Student)).await.unwrap();
        let bob = store.create_user(new_user("bob", Role::Student)).await.unwrap();

        store.create_print_job(new_job(&alice.id, 1)).await.unwrap();
        store.create_print_job(new_job(&bob.id, 1)).await.unwrap();
        store.create_print_job(new_job(&alice.id, 1)).await.unwrap();

        let alices = store.get_print_jobs_by_user(&alice.id).await.unwrap();
        assert_eq!(alices.len(), 2);
        assert!(alices.iter().all(|r| r.job.owner_id == alice.id));
        assert!(alices.iter().all(|r| r.user.username == "alice"));

        let all = store.get_print_jobs().await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn listing_orders_newest_first() {
        let store = MemoryStorage::new();
        let owner = store.create_user(new_user("dave", Role::Student)).await.unwrap();

        let first = store.create_print_job(new_job(&owner.id, 1)).await.unwrap();
        let second = store.create_print_job(new_job(&owner.id, 1)).await.unwrap();

        let all = store.get_print_jobs().await.unwrap();
        assert_eq!(all[0].job.id, second.id);
        assert_eq!(all[1].job.id, first.id);
    }

    #[tokio::test]
    async fn orphaned_job_gets_placeholder_owner() {
        let store = MemoryStorage::new();
        store.create_print_job(new_job("missing-user", 1)).await.unwrap();

        let all = store.get_print_jobs().await.unwrap();
        assert_eq!(all[0].user.username, "unknown");
        assert_eq!(all[0].user.name, "Unknown");
    }

    #[tokio::test]
    async fn status_update_overwrites_and_missing_job_is_not_found() {
        let store = MemoryStorage::new();
        let owner = store.create_user(new_user("erin", Role::Student)).await.unwrap();
        let job = store.create_print_job(new_job(&owner.id, 1)).await.unwrap();

        let updated = store
            .update_print_job_status(&job.id, JobStatus::Printing)
            .await
            .unwrap();
        assert_eq!(updated.status, JobStatus::Printing);
        assert_eq!(updated.queue_number, job.queue_number);

        let err = store
            .update_print_job_status("no-such-job", JobStatus::Ready)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn profile_and_password_updates_are_partial() {
        let store = MemoryStorage::new();
        let user = store.create_user(new_user("fay", Role::Student)).await.unwrap();

        let updated = store
            .update_user(
                &user.id,
                UserUpdate {
                    name: Some("Fay Kim".into()),
                    phone: Some(Some("555-0101".into())),
                    password_hash: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Fay Kim");
        assert_eq!(updated.phone.as_deref(), Some("555-0101"));
        assert_eq!(updated.password_hash, "hash");

        let updated = store
            .update_user(
                &user.id,
                UserUpdate {
                    password_hash: Some("new-hash".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.password_hash, "new-hash");
        assert_eq!(updated.name, "Fay Kim");

        let err = store
            .update_user("no-such-user", UserUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
