//! Record store traits.

use async_trait::async_trait;

use vodkit_models::{Asset, AssetId, JobId, TranscodeJob, Variant};

use crate::error::RecordResult;

/// Durable, transactional storage for asset, job and variant records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Open a transaction. All reads and staged writes go through the
    /// returned handle; nothing is visible to other transactions until
    /// [`RecordTx::commit`].
    async fn begin(&self) -> RecordResult<Box<dyn RecordTx + '_>>;
}

/// One open transaction against a [`RecordStore`].
///
/// Writes take immutable snapshots of the record. Dropping the handle
/// without committing rolls back every staged write.
#[async_trait]
pub trait RecordTx: Send {
    async fn load_job(&mut self, id: &JobId) -> RecordResult<Option<TranscodeJob>>;

    async fn save_job(&mut self, job: &TranscodeJob) -> RecordResult<()>;

    async fn load_asset(&mut self, id: &AssetId) -> RecordResult<Option<Asset>>;

    async fn save_asset(&mut self, asset: &Asset) -> RecordResult<()>;

    /// Load the variants currently recorded for a job, ordered by level.
    async fn load_variants(&mut self, job_id: &JobId) -> RecordResult<Vec<Variant>>;

    /// Atomically replace every variant row owned by `job_id`.
    async fn replace_variants(
        &mut self,
        job_id: &JobId,
        video_id: &AssetId,
        variants: &[Variant],
    ) -> RecordResult<()>;

    /// Commit the staged writes.
    async fn commit(self: Box<Self>) -> RecordResult<()>;
}
