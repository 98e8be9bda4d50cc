//! Job dispatch: the state machine driver.

use std::sync::Arc;

use metrics::counter;
use tracing::{info, warn};

use vodkit_models::{JobId, JobStatus};
use vodkit_records::RecordStore;

use crate::error::WorkerResult;
use crate::pool::WorkerPool;

/// What a call to [`JobDispatcher::dispatch`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The job was claimed and queued for execution
    Dispatched,
    /// The job was already past Pending; nothing to do
    AlreadyDispatched,
    /// No job exists with this id
    NotFound,
    /// The pool refused the submission; the job is back in Pending
    Rejected,
}

/// Drives jobs out of Pending and onto the worker pool.
///
/// The Pending -> Dispatched compare-and-set makes `dispatch` idempotent:
/// calling it any number of times for the same id starts at most one
/// execution. The dispatcher exclusively owns job status transitions and
/// the matching asset transitions (through the executor it feeds).
pub struct JobDispatcher {
    records: Arc<dyn RecordStore>,
    pool: WorkerPool,
}

impl JobDispatcher {
    pub fn new(records: Arc<dyn RecordStore>, pool: WorkerPool) -> Self {
        Self { records, pool }
    }

    /// Dispatch a pending job for asynchronous execution.
    ///
    /// Never surfaces execution failures; callers observe those by polling
    /// job and asset records. The returned outcome reports what this call
    /// itself did.
    pub async fn dispatch(&self, job_id: &JobId) -> WorkerResult<DispatchOutcome> {
        let mut tx = self.records.begin().await?;

        let Some(job) = tx.load_job(job_id).await? else {
            warn!(job_id = %job_id, "Dispatch requested for unknown job");
            return Ok(DispatchOutcome::NotFound);
        };
        if job.status != JobStatus::Pending {
            info!(job_id = %job_id, status = %job.status, "Job already dispatched, skipping");
            return Ok(DispatchOutcome::AlreadyDispatched);
        }

        tx.save_job(&job.dispatched()).await?;
        tx.commit().await?;

        match self.pool.try_submit(job_id.clone()) {
            Ok(()) => {
                counter!("vodkit_jobs_dispatched_total").increment(1);
                Ok(DispatchOutcome::Dispatched)
            }
            Err(e) => {
                warn!(job_id = %job_id, "Worker pool rejected job: {}", e);
                self.release(job_id).await?;
                counter!("vodkit_jobs_rejected_total").increment(1);
                Ok(DispatchOutcome::Rejected)
            }
        }
    }

    /// Roll a job the pool refused back to Pending so it can be
    /// re-dispatched later; a rejected submission must not strand the job
    /// in Dispatched.
    async fn release(&self, job_id: &JobId) -> WorkerResult<()> {
        let mut tx = self.records.begin().await?;
        if let Some(job) = tx.load_job(job_id).await? {
            if job.status == JobStatus::Dispatched {
                tx.save_job(&job.released()).await?;
            }
        }
        tx.commit().await?;
        Ok(())
    }

    /// Stop the pool, waiting for in-flight executions.
    pub async fn shutdown(self) {
        self.pool.shutdown().await;
    }
}
