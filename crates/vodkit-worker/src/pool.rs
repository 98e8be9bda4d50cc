//! Bounded worker pool.
//!
//! A fixed set of worker tasks drains a bounded channel of job ids. The
//! submit path never blocks: a full queue or a stopped pool is reported to
//! the caller so the dispatcher can roll the job back instead of stranding
//! it in Dispatched.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use vodkit_models::JobId;

use crate::config::PoolConfig;

/// Handler invoked by pool workers for each submitted job.
#[async_trait]
pub trait JobHandler: Send + Sync + 'static {
    async fn handle(&self, job_id: JobId);
}

/// Why a submission was not accepted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("worker pool queue is full")]
    Saturated,

    #[error("worker pool is shut down")]
    Closed,
}

/// Bounded, queued task executor for job executions.
pub struct WorkerPool {
    queue: mpsc::Sender<JobId>,
    workers: Vec<JoinHandle<()>>,
    config: PoolConfig,
}

impl WorkerPool {
    /// Start the pool with a fixed worker set.
    pub fn start(config: PoolConfig, handler: Arc<dyn JobHandler>) -> Self {
        let (queue, receiver) = mpsc::channel::<JobId>(config.queue_depth.max(1));
        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));

        let workers = (0..config.workers.max(1))
            .map(|worker| {
                let receiver = Arc::clone(&receiver);
                let handler = Arc::clone(&handler);
                tokio::spawn(async move {
                    loop {
                        // The lock guards only the receive; it is released
                        // before the job runs so workers drain in parallel.
                        let job_id = { receiver.lock().await.recv().await };
                        match job_id {
                            Some(job_id) => {
                                debug!(worker = worker, job_id = %job_id, "Worker picked up job");
                                handler.handle(job_id).await;
                            }
                            None => break,
                        }
                    }
                    debug!(worker = worker, "Worker stopped");
                })
            })
            .collect();

        info!(
            workers = config.workers,
            queue_depth = config.queue_depth,
            "Worker pool started"
        );

        Self {
            queue,
            workers,
            config,
        }
    }

    /// Enqueue a job execution without blocking.
    pub fn try_submit(&self, job_id: JobId) -> Result<(), SubmitError> {
        self.queue.try_send(job_id).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SubmitError::Saturated,
            mpsc::error::TrySendError::Closed(_) => SubmitError::Closed,
        })
    }

    /// Stop accepting work and wait for in-flight jobs to finish.
    pub async fn shutdown(self) {
        let Self {
            queue,
            workers,
            config,
        } = self;
        drop(queue);

        let drain = async {
            for worker in workers {
                let _ = worker.await;
            }
        };
        if tokio::time::timeout(config.shutdown_timeout, drain).await.is_err() {
            warn!("Worker pool shutdown timed out with jobs still in flight");
        } else {
            info!("Worker pool stopped");
        }
    }
}
