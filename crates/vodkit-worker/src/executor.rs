//! Job execution body.

use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use tracing::{error, info, warn};

use vodkit_models::{Asset, JobId, TranscodeResult, Variant};
use vodkit_records::RecordStore;

use crate::error::{WorkerError, WorkerResult};
use crate::pool::JobHandler;
use crate::transcoder::Transcoder;

/// Runs dispatched jobs on the worker pool.
///
/// Every failure inside an execution is converted into a terminal job and
/// asset state; nothing escapes to crash a worker. Each record-store step
/// runs in its own short transaction, so no transaction is held open across
/// the external process.
pub struct JobExecutor {
    records: Arc<dyn RecordStore>,
    transcoder: Arc<Transcoder>,
}

impl JobExecutor {
    pub fn new(records: Arc<dyn RecordStore>, transcoder: Arc<Transcoder>) -> Self {
        Self {
            records,
            transcoder,
        }
    }

    /// Execute a single dispatched job to a terminal state.
    pub async fn execute(&self, job_id: &JobId) {
        let asset = match self.prepare(job_id).await {
            Ok(Some(asset)) => asset,
            Ok(None) => return,
            Err(e) => {
                error!(job_id = %job_id, "Job preparation failed: {}", e);
                return;
            }
        };

        info!(job_id = %job_id, asset_id = %asset.id, "Transcoding {}", asset.source_object);
        let outcome = self
            .transcoder
            .transcode_to_hls(&asset.source_bucket, &asset.source_object)
            .await;

        match outcome {
            Ok(result) => match self.mark_success(job_id, &result).await {
                Ok(()) => {
                    counter!("vodkit_jobs_succeeded_total").increment(1);
                    info!(job_id = %job_id, "Job succeeded");
                }
                // The transcode output is unusable if we cannot record it;
                // the job must still reach a terminal state.
                Err(e) => {
                    error!(job_id = %job_id, "Failed to persist job success: {}", e);
                    self.mark_failure(job_id, &e.to_string()).await;
                    counter!("vodkit_jobs_failed_total").increment(1);
                }
            },
            Err(e) => {
                error!(job_id = %job_id, "Job failed: {}", e);
                self.mark_failure(job_id, &e.to_string()).await;
                counter!("vodkit_jobs_failed_total").increment(1);
            }
        }
    }

    /// Reload the job and its asset, then mark the job Running.
    ///
    /// Returns `Ok(None)` when execution must not proceed: the job vanished
    /// (logged only) or its asset is missing (a data-integrity fault that
    /// fails the job without running the transcoder).
    async fn prepare(&self, job_id: &JobId) -> WorkerResult<Option<Asset>> {
        let mut tx = self.records.begin().await?;

        let Some(job) = tx.load_job(job_id).await? else {
            warn!(job_id = %job_id, "Job not found during preparation");
            return Ok(None);
        };

        let Some(asset) = tx.load_asset(&job.video_id).await? else {
            error!(job_id = %job_id, asset_id = %job.video_id, "Video asset missing for job");
            tx.save_job(&job.failed(WorkerError::MissingAsset.to_string()))
                .await?;
            tx.commit().await?;
            return Ok(None);
        };

        tx.save_job(&job.running()).await?;
        tx.commit().await?;

        Ok(Some(asset))
    }

    /// Persist a successful attempt: job Success, asset Ready, variants
    /// replaced, in one transaction.
    async fn mark_success(&self, job_id: &JobId, result: &TranscodeResult) -> WorkerResult<()> {
        let mut tx = self.records.begin().await?;

        let Some(job) = tx.load_job(job_id).await? else {
            return Err(WorkerError::Records(
                vodkit_records::RecordError::transaction_failed(format!(
                    "job {} not found during success handling",
                    job_id
                )),
            ));
        };
        let video_id = job.video_id.clone();
        tx.save_job(&job.succeeded()).await?;

        let Some(asset) = tx.load_asset(&video_id).await? else {
            return Err(WorkerError::Records(
                vodkit_records::RecordError::transaction_failed(format!(
                    "asset {} not found during success handling",
                    video_id
                )),
            ));
        };
        tx.save_asset(&asset.ready(result.playback_url.clone())).await?;

        let rows: Vec<Variant> = result
            .variants
            .iter()
            .cloned()
            .map(|d| Variant::from_descriptor(job_id.clone(), video_id.clone(), d))
            .collect();
        tx.replace_variants(job_id, &video_id, &rows).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Persist a failed attempt: job and asset Failed, reason recorded.
    /// Record-store errors here are logged, never propagated.
    async fn mark_failure(&self, job_id: &JobId, reason: &str) {
        let result: WorkerResult<()> = async {
            let mut tx = self.records.begin().await?;

            if let Some(job) = tx.load_job(job_id).await? {
                let video_id = job.video_id.clone();
                tx.save_job(&job.failed(reason)).await?;

                if let Some(asset) = tx.load_asset(&video_id).await? {
                    tx.save_asset(&asset.failed()).await?;
                }
            }

            tx.commit().await?;
            Ok(())
        }
        .await;

        if let Err(e) = result {
            error!(job_id = %job_id, "Failed to persist job failure: {}", e);
        }
    }
}

#[async_trait]
impl JobHandler for JobExecutor {
    async fn handle(&self, job_id: JobId) {
        self.execute(&job_id).await;
    }
}
