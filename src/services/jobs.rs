use std::sync::Arc;

use crate::errors::{AppError, AppResult};
use crate::models::{JobRecord, JobStatus, NewPrintJob, PrintJob, PrintType, SessionUser};
use crate::storage::Storage;

/// Job lifecycle engine: authorization and queue-ordering policy layered
/// over the store. Holds no state of its own, so any number of instances
/// can run in front of one store.
#[derive(Clone)]
pub struct JobService {
    storage: Arc<dyn Storage>,
}

impl JobService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Staff see the whole queue re-sorted for triage; students see their
    /// own jobs, newest first.
    pub async fn list_jobs(&self, requester: &SessionUser) -> AppResult<Vec<JobRecord>> {
        if requester.is_staff() {
            let mut records = self.storage.get_print_jobs().await?;
            records.sort_by_key(|r| (r.job.status.triage_rank(), r.job.queue_number));
            Ok(records)
        } else {
            self.storage.get_print_jobs_by_user(&requester.id).await
        }
    }

    /// Any authenticated identity may submit; staff submissions are not
    /// special-cased. The requester becomes the owner.
    pub async fn submit_job(
        &self,
        requester: &SessionUser,
        file_name: String,
        file_handle: String,
        copies: u32,
        print_type: PrintType,
    ) -> AppResult<PrintJob> {
        let job = self
            .storage
            .create_print_job(NewPrintJob {
                owner_id: requester.id.clone(),
                file_name,
                file_handle,
                copies,
                print_type,
            })
            .await?;
        tracing::info!(
            "Job {} submitted by {} (queue #{}, {} min estimated)",
            job.id,
            requester.username,
            job.queue_number,
            job.estimated_minutes
        );
        Ok(job)
    }

    /// Single job lookup, readable by the owner and by staff only.
    pub async fn job_detail(&self, requester: &SessionUser, job_id: &str) -> AppResult<PrintJob> {
        let job = self
            .storage
            .get_print_job(job_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Job not found".into()))?;
        if !requester.is_staff() && job.owner_id != requester.id {
            return Err(AppError::Forbidden("Not allowed to view this job".into()));
        }
        Ok(job)
    }

    /// Staff-only status overwrite. The role gate comes first so non-staff
    /// callers always get Forbidden, even for jobs they own or jobs that do
    /// not exist. The four status values are the only accepted inputs; the
    /// transition itself is not order-checked.
    pub async fn set_status(
        &self,
        requester: &SessionUser,
        job_id: &str,
        raw_status: &str,
    ) -> AppResult<PrintJob> {
        if !requester.is_staff() {
            return Err(AppError::Forbidden("Staff role required".into()));
        }
        let status = JobStatus::parse(raw_status)
            .ok_or_else(|| AppError::Validation("Invalid status".into()))?;
        let job = self.storage.update_print_job_status(job_id, status).await?;
        tracing::info!(
            "Job {} set to {} by {}",
            job.id,
            job.status.as_str(),
            requester.username
        );
        Ok(job)
    }
}
