//! In-memory transactional record store.
//!
//! Transactions are serialized by an owned mutex guard over the tables; each
//! transaction mutates a working copy that only becomes visible on commit.
//! Intended for embedders without a database and for tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use vodkit_models::{Asset, AssetId, JobId, TranscodeJob, Variant};

use crate::error::RecordResult;
use crate::store::{RecordStore, RecordTx};

#[derive(Debug, Default, Clone)]
struct Tables {
    jobs: HashMap<JobId, TranscodeJob>,
    assets: HashMap<AssetId, Asset>,
    variants: Vec<Variant>,
}

/// In-memory [`RecordStore`] engine.
#[derive(Clone, Default)]
pub struct MemoryRecordStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a job outside any caller-visible transaction (seeding helper).
    pub async fn insert_job(&self, job: TranscodeJob) {
        self.tables.lock().await.jobs.insert(job.id.clone(), job);
    }

    /// Insert an asset outside any caller-visible transaction.
    pub async fn insert_asset(&self, asset: Asset) {
        self.tables
            .lock()
            .await
            .assets
            .insert(asset.id.clone(), asset);
    }

    /// Read a job snapshot without opening a transaction.
    pub async fn job(&self, id: &JobId) -> Option<TranscodeJob> {
        self.tables.lock().await.jobs.get(id).cloned()
    }

    /// Read an asset snapshot without opening a transaction.
    pub async fn asset(&self, id: &AssetId) -> Option<Asset> {
        self.tables.lock().await.assets.get(id).cloned()
    }

    /// Read the variant rows for a job without opening a transaction.
    pub async fn variants(&self, job_id: &JobId) -> Vec<Variant> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<Variant> = tables
            .variants
            .iter()
            .filter(|v| &v.job_id == job_id)
            .cloned()
            .collect();
        rows.sort_by_key(|v| v.level);
        rows
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn begin(&self) -> RecordResult<Box<dyn RecordTx + '_>> {
        let guard = Arc::clone(&self.tables).lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTx { guard, working }))
    }
}

struct MemoryTx {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
}

#[async_trait]
impl RecordTx for MemoryTx {
    async fn load_job(&mut self, id: &JobId) -> RecordResult<Option<TranscodeJob>> {
        Ok(self.working.jobs.get(id).cloned())
    }

    async fn save_job(&mut self, job: &TranscodeJob) -> RecordResult<()> {
        self.working.jobs.insert(job.id.clone(), job.clone());
        Ok(())
    }

    async fn load_asset(&mut self, id: &AssetId) -> RecordResult<Option<Asset>> {
        Ok(self.working.assets.get(id).cloned())
    }

    async fn save_asset(&mut self, asset: &Asset) -> RecordResult<()> {
        self.working.assets.insert(asset.id.clone(), asset.clone());
        Ok(())
    }

    async fn load_variants(&mut self, job_id: &JobId) -> RecordResult<Vec<Variant>> {
        let mut rows: Vec<Variant> = self
            .working
            .variants
            .iter()
            .filter(|v| &v.job_id == job_id)
            .cloned()
            .collect();
        rows.sort_by_key(|v| v.level);
        Ok(rows)
    }

    async fn replace_variants(
        &mut self,
        job_id: &JobId,
        video_id: &AssetId,
        variants: &[Variant],
    ) -> RecordResult<()> {
        self.working.variants.retain(|v| &v.job_id != job_id);
        for variant in variants {
            debug_assert_eq!(&variant.job_id, job_id);
            debug_assert_eq!(&variant.video_id, video_id);
            self.working.variants.push(variant.clone());
        }
        debug!(job_id = %job_id, count = variants.len(), "Replaced variant rows");
        Ok(())
    }

    async fn commit(self: Box<Self>) -> RecordResult<()> {
        let mut this = *self;
        *this.guard = this.working;
        Ok(())
    }
}
