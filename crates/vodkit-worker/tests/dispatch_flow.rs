//! End-to-end dispatch and execution flow tests.
//!
//! The external encoder and the object store are faked at their trait
//! seams: the runner records its argv and fabricates the HLS output tree,
//! the object store keeps uploads in memory.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use vodkit_media::{CommandRunner, MediaResult};
use vodkit_models::{Asset, AssetId, AssetStatus, JobId, JobStatus, TranscodeJob, Variant};
use vodkit_records::{MemoryRecordStore, RecordError, RecordResult, RecordStore, RecordTx};
use vodkit_storage::{ObjectStore, StorageError, StorageResult};
use vodkit_worker::{
    DispatchOutcome, JobDispatcher, JobExecutor, PoolConfig, TranscodeConfig, Transcoder,
    WorkerPool,
};

/// Scripted stand-in for the FFmpeg runner.
struct FakeRunner {
    exit_code: i32,
    write_outputs: bool,
    started: AtomicUsize,
    gate: tokio::sync::Semaphore,
    calls: Mutex<Vec<Vec<String>>>,
}

impl FakeRunner {
    fn succeeding() -> Self {
        Self {
            exit_code: 0,
            write_outputs: true,
            started: AtomicUsize::new(0),
            gate: tokio::sync::Semaphore::new(tokio::sync::Semaphore::MAX_PERMITS),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn failing(exit_code: i32) -> Self {
        Self {
            exit_code,
            write_outputs: false,
            ..Self::succeeding()
        }
    }

    /// A runner that blocks inside `run` until permits are added.
    fn blocked() -> Self {
        Self {
            gate: tokio::sync::Semaphore::new(0),
            ..Self::succeeding()
        }
    }

    async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, argv: &[String]) -> MediaResult<i32> {
        self.calls.lock().await.push(argv.to_vec());
        self.started.fetch_add(1, Ordering::SeqCst);
        let _permit = self.gate.acquire().await;

        if self.write_outputs {
            write_fixture_tree(argv).await;
        }
        Ok(self.exit_code)
    }
}

/// Fabricate the output tree a real ladder encode would leave behind,
/// derived from the playlist template at the end of the argv.
async fn write_fixture_tree(argv: &[String]) {
    let playlist_template = argv.last().expect("argv has output template");
    let out_dir = playlist_template
        .strip_suffix("v%v/stream.m3u8")
        .expect("playlist template shape")
        .trim_end_matches('/')
        .to_string();

    let var_stream_map = argv
        .iter()
        .position(|a| a == "-var_stream_map")
        .map(|i| argv[i + 1].clone())
        .expect("var_stream_map present");
    let tiers = var_stream_map.split_whitespace().count();

    let mut master = String::from("#EXTM3U\n");
    for level in 0..tiers {
        master.push_str(&format!(
            "#EXT-X-STREAM-INF:BANDWIDTH=5500000,RESOLUTION=1920x1080,CODECS=\"avc1.64002a,mp4a.40.2\"\nv{}/stream.m3u8\n",
            level
        ));
        let tier_dir = format!("{}/v{}", out_dir, level);
        tokio::fs::create_dir_all(&tier_dir).await.unwrap();

        let mut playlist = String::from("#EXTM3U\n#EXT-X-VERSION:7\n");
        for segment in 0..3 {
            playlist.push_str(&format!("#EXTINF:4.000000,\nseg_{:06}.m4s\n", segment));
            tokio::fs::write(format!("{}/seg_{:06}.m4s", tier_dir, segment), b"segment")
                .await
                .unwrap();
        }
        playlist.push_str("#EXT-X-ENDLIST\n");
        tokio::fs::write(format!("{}/stream.m3u8", tier_dir), playlist)
            .await
            .unwrap();
    }
    tokio::fs::write(format!("{}/master.m3u8", out_dir), master)
        .await
        .unwrap();
}

/// In-memory object store with a scriptable download failure.
#[derive(Default)]
struct FakeObjectStore {
    fail_download: bool,
    uploads: Mutex<Vec<(String, String, String)>>,
}

impl FakeObjectStore {
    fn new() -> Self {
        Self::default()
    }

    fn failing_downloads() -> Self {
        Self {
            fail_download: true,
            ..Self::default()
        }
    }

    async fn uploaded_keys(&self) -> Vec<String> {
        self.uploads.lock().await.iter().map(|(_, k, _)| k.clone()).collect()
    }
}

#[async_trait]
impl ObjectStore for FakeObjectStore {
    async fn download(&self, _bucket: &str, key: &str, local_path: &Path) -> StorageResult<()> {
        if self.fail_download {
            return Err(StorageError::download_failed(key, "connection reset by peer"));
        }
        if let Some(parent) = local_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(local_path, b"source bytes").await?;
        Ok(())
    }

    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        local_path: &Path,
        content_type: &str,
    ) -> StorageResult<()> {
        assert!(local_path.exists(), "upload of missing file {:?}", local_path);
        self.uploads
            .lock()
            .await
            .push((bucket.to_string(), key.to_string(), content_type.to_string()));
        Ok(())
    }
}

/// Record store whose next `replace_variants` fails, then recovers.
struct FlakyVariantStore {
    inner: MemoryRecordStore,
    fail_next_replace: AtomicBool,
}

impl FlakyVariantStore {
    fn new(inner: MemoryRecordStore) -> Self {
        Self {
            inner,
            fail_next_replace: AtomicBool::new(true),
        }
    }
}

#[async_trait]
impl RecordStore for FlakyVariantStore {
    async fn begin(&self) -> RecordResult<Box<dyn RecordTx + '_>> {
        Ok(Box::new(FlakyTx {
            inner: self.inner.begin().await?,
            fail_next_replace: &self.fail_next_replace,
        }))
    }
}

struct FlakyTx<'a> {
    inner: Box<dyn RecordTx + 'a>,
    fail_next_replace: &'a AtomicBool,
}

#[async_trait]
impl RecordTx for FlakyTx<'_> {
    async fn load_job(&mut self, id: &JobId) -> RecordResult<Option<TranscodeJob>> {
        self.inner.load_job(id).await
    }

    async fn save_job(&mut self, job: &TranscodeJob) -> RecordResult<()> {
        self.inner.save_job(job).await
    }

    async fn load_asset(&mut self, id: &AssetId) -> RecordResult<Option<Asset>> {
        self.inner.load_asset(id).await
    }

    async fn save_asset(&mut self, asset: &Asset) -> RecordResult<()> {
        self.inner.save_asset(asset).await
    }

    async fn load_variants(&mut self, job_id: &JobId) -> RecordResult<Vec<Variant>> {
        self.inner.load_variants(job_id).await
    }

    async fn replace_variants(
        &mut self,
        job_id: &JobId,
        video_id: &AssetId,
        variants: &[Variant],
    ) -> RecordResult<()> {
        if self.fail_next_replace.swap(false, Ordering::SeqCst) {
            return Err(RecordError::transaction_failed("connection lost"));
        }
        self.inner.replace_variants(job_id, video_id, variants).await
    }

    async fn commit(self: Box<Self>) -> RecordResult<()> {
        self.inner.commit().await
    }
}

struct Harness {
    records: MemoryRecordStore,
    objects: Arc<FakeObjectStore>,
    runner: Arc<FakeRunner>,
    dispatcher: JobDispatcher,
    work_root: tempfile::TempDir,
}

impl Harness {
    fn new(runner: FakeRunner, objects: FakeObjectStore, pool: PoolConfig) -> Self {
        let records = MemoryRecordStore::new();
        let objects = Arc::new(objects);
        let runner = Arc::new(runner);
        let work_root = tempfile::tempdir().unwrap();

        let config = TranscodeConfig {
            work_root: work_root.path().to_path_buf(),
            ..TranscodeConfig::default()
        };

        let records_dyn: Arc<dyn RecordStore> = Arc::new(records.clone());
        let transcoder = Arc::new(Transcoder::new(
            Arc::clone(&objects) as Arc<dyn ObjectStore>,
            Arc::clone(&runner) as Arc<dyn CommandRunner>,
            config,
        ));
        let executor = Arc::new(JobExecutor::new(Arc::clone(&records_dyn), transcoder));
        let dispatcher = JobDispatcher::new(records_dyn, WorkerPool::start(pool, executor));

        Self {
            records,
            objects,
            runner,
            dispatcher,
            work_root,
        }
    }

    fn with_runner(runner: FakeRunner) -> Self {
        Self::new(runner, FakeObjectStore::new(), PoolConfig::default())
    }

    /// Seed a Processing asset and a Pending job for `clip.mp4`.
    async fn seed_job(&self) -> TranscodeJob {
        let asset = Asset::new("clip", "src", "uploads/clip.mp4").processing();
        let job = TranscodeJob::new_hls(asset.id.clone(), "hls-1080p");
        self.records.insert_asset(asset).await;
        self.records.insert_job(job.clone()).await;
        job
    }

    async fn wait_terminal(&self, job_id: &JobId) -> TranscodeJob {
        for _ in 0..500 {
            if let Some(job) = self.records.job(job_id).await {
                if job.status.is_terminal() {
                    return job;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {} never reached a terminal state", job_id);
    }

    async fn assert_work_root_empty(&self) {
        let mut entries = tokio::fs::read_dir(self.work_root.path()).await.unwrap();
        assert!(
            entries.next_entry().await.unwrap().is_none(),
            "working directories left behind"
        );
    }
}

#[tokio::test]
async fn successful_job_marks_asset_ready_and_persists_variants() {
    let harness = Harness::with_runner(FakeRunner::succeeding());
    let job = harness.seed_job().await;

    let outcome = harness.dispatcher.dispatch(&job.id).await.unwrap();
    assert_eq!(outcome, DispatchOutcome::Dispatched);

    let done = harness.wait_terminal(&job.id).await;
    assert_eq!(done.status, JobStatus::Success);
    assert!(done.error_message.is_none());
    assert!(done.started_at.is_some() && done.finished_at.is_some());

    let asset = harness.records.asset(&job.video_id).await.unwrap();
    assert_eq!(asset.status, AssetStatus::Ready);
    assert_eq!(asset.playback_url.as_deref(), Some("/vod/clip/master.m3u8"));
    assert!(asset.ready_at.is_some());

    let variants = harness.records.variants(&job.id).await;
    assert_eq!(variants.len(), 1);
    let v = &variants[0];
    assert_eq!(v.level, 0);
    assert_eq!(v.resolution, "1920x1080");
    assert_eq!(v.bitrate_kbps, 5000);
    assert_eq!(v.playlist_path, "vod/clip/v0/stream.m3u8");
    assert_eq!(v.segment_path_prefix, "vod/clip/v0/");
    assert_eq!(v.duration_seconds, Some(12));
    let checksum = v.checksum.as_deref().unwrap();
    assert_eq!(checksum.len(), 32);

    let keys = harness.objects.uploaded_keys().await;
    assert!(keys.contains(&"vod/clip/master.m3u8".to_string()));
    assert!(keys.contains(&"vod/clip/v0/stream.m3u8".to_string()));
    assert!(keys.contains(&"vod/clip/v0/seg_000000.m4s".to_string()));

    let uploads = harness.objects.uploads.lock().await;
    let master = uploads
        .iter()
        .find(|(_, k, _)| k == "vod/clip/master.m3u8")
        .unwrap();
    assert_eq!(master.0, "media");
    assert_eq!(master.2, "application/vnd.apple.mpegurl");
    drop(uploads);

    harness.assert_work_root_empty().await;
}

#[tokio::test]
async fn dispatch_is_idempotent() {
    let harness = Harness::with_runner(FakeRunner::succeeding());
    let job = harness.seed_job().await;

    let first = harness.dispatcher.dispatch(&job.id).await.unwrap();
    let second = harness.dispatcher.dispatch(&job.id).await.unwrap();
    assert_eq!(first, DispatchOutcome::Dispatched);
    assert_eq!(second, DispatchOutcome::AlreadyDispatched);

    harness.wait_terminal(&job.id).await;
    assert_eq!(harness.runner.call_count().await, 1);
}

#[tokio::test]
async fn dispatch_of_running_job_is_a_no_op() {
    let harness = Harness::with_runner(FakeRunner::succeeding());
    let asset = Asset::new("clip", "src", "uploads/clip.mp4").processing();
    let job = TranscodeJob::new_hls(asset.id.clone(), "hls-1080p")
        .dispatched()
        .running();
    harness.records.insert_asset(asset).await;
    harness.records.insert_job(job.clone()).await;

    let outcome = harness.dispatcher.dispatch(&job.id).await.unwrap();
    assert_eq!(outcome, DispatchOutcome::AlreadyDispatched);
    assert_eq!(harness.runner.call_count().await, 0);
}

#[tokio::test]
async fn dispatch_of_unknown_job_returns_not_found() {
    let harness = Harness::with_runner(FakeRunner::succeeding());
    let outcome = harness.dispatcher.dispatch(&JobId::new()).await.unwrap();
    assert_eq!(outcome, DispatchOutcome::NotFound);
}

#[tokio::test]
async fn nonzero_exit_fails_job_and_asset_with_exit_code() {
    let harness = Harness::with_runner(FakeRunner::failing(187));
    let job = harness.seed_job().await;

    harness.dispatcher.dispatch(&job.id).await.unwrap();
    let done = harness.wait_terminal(&job.id).await;

    assert_eq!(done.status, JobStatus::Failed);
    assert!(done.error_message.as_deref().unwrap().contains("187"));

    let asset = harness.records.asset(&job.video_id).await.unwrap();
    assert_eq!(asset.status, AssetStatus::Failed);
    assert!(asset.playback_url.is_none());

    assert!(harness.records.variants(&job.id).await.is_empty());
    assert!(harness.objects.uploaded_keys().await.is_empty());
    harness.assert_work_root_empty().await;
}

#[tokio::test]
async fn failed_success_bookkeeping_still_fails_the_job() {
    // The encode succeeds, but persisting the success fails. The job must
    // not be stranded in Running.
    let records = MemoryRecordStore::new();
    let store: Arc<dyn RecordStore> = Arc::new(FlakyVariantStore::new(records.clone()));

    let work_root = tempfile::tempdir().unwrap();
    let config = TranscodeConfig {
        work_root: work_root.path().to_path_buf(),
        ..TranscodeConfig::default()
    };
    let transcoder = Arc::new(Transcoder::new(
        Arc::new(FakeObjectStore::new()) as Arc<dyn ObjectStore>,
        Arc::new(FakeRunner::succeeding()) as Arc<dyn CommandRunner>,
        config,
    ));
    let executor = JobExecutor::new(Arc::clone(&store), transcoder);

    let asset = Asset::new("clip", "src", "uploads/clip.mp4").processing();
    let job = TranscodeJob::new_hls(asset.id.clone(), "hls-1080p").dispatched();
    records.insert_asset(asset).await;
    records.insert_job(job.clone()).await;

    executor.execute(&job.id).await;

    let done = records.job(&job.id).await.unwrap();
    assert_eq!(done.status, JobStatus::Failed);
    assert!(done.error_message.as_deref().unwrap().contains("connection lost"));

    let asset = records.asset(&job.video_id).await.unwrap();
    assert_eq!(asset.status, AssetStatus::Failed);
    assert!(records.variants(&job.id).await.is_empty());
}

#[tokio::test]
async fn download_failure_fails_job_naming_the_source_key() {
    let harness = Harness::new(
        FakeRunner::succeeding(),
        FakeObjectStore::failing_downloads(),
        PoolConfig::default(),
    );
    let job = harness.seed_job().await;

    harness.dispatcher.dispatch(&job.id).await.unwrap();
    let done = harness.wait_terminal(&job.id).await;

    assert_eq!(done.status, JobStatus::Failed);
    assert!(done
        .error_message
        .as_deref()
        .unwrap()
        .contains("uploads/clip.mp4"));

    let asset = harness.records.asset(&job.video_id).await.unwrap();
    assert_eq!(asset.status, AssetStatus::Failed);

    // The encoder never ran and nothing was uploaded.
    assert_eq!(harness.runner.call_count().await, 0);
    assert!(harness.objects.uploaded_keys().await.is_empty());
    harness.assert_work_root_empty().await;
}

#[tokio::test]
async fn missing_asset_fails_job_without_running_transcoder() {
    let harness = Harness::with_runner(FakeRunner::succeeding());
    let job = TranscodeJob::new_hls("no-such-asset".into(), "hls-1080p");
    harness.records.insert_job(job.clone()).await;

    harness.dispatcher.dispatch(&job.id).await.unwrap();
    let done = harness.wait_terminal(&job.id).await;

    assert_eq!(done.status, JobStatus::Failed);
    assert_eq!(done.error_message.as_deref(), Some("Missing video asset"));
    assert_eq!(harness.runner.call_count().await, 0);
}

#[tokio::test]
async fn rerun_replaces_variants_for_the_new_job_only() {
    let harness = Harness::with_runner(FakeRunner::succeeding());
    let first = harness.seed_job().await;

    harness.dispatcher.dispatch(&first.id).await.unwrap();
    harness.wait_terminal(&first.id).await;

    // Retry is a new job row for the same asset.
    let second = TranscodeJob::new_hls(first.video_id.clone(), "hls-1080p");
    harness.records.insert_job(second.clone()).await;
    harness.dispatcher.dispatch(&second.id).await.unwrap();
    harness.wait_terminal(&second.id).await;

    let second_variants = harness.records.variants(&second.id).await;
    assert_eq!(second_variants.len(), 1);
    assert!(second_variants.iter().all(|v| v.job_id == second.id));

    // The first job's rows were untouched by the second run's replace.
    assert_eq!(harness.records.variants(&first.id).await.len(), 1);
}

#[tokio::test]
async fn rejected_submission_rolls_job_back_to_pending() {
    let harness = Harness::new(
        FakeRunner::blocked(),
        FakeObjectStore::new(),
        PoolConfig {
            workers: 1,
            queue_depth: 1,
            shutdown_timeout: Duration::from_secs(5),
        },
    );

    let occupant = harness.seed_job().await;
    let queued = harness.seed_job().await;
    let overflow = harness.seed_job().await;

    // Occupy the single worker before filling the queue.
    assert_eq!(
        harness.dispatcher.dispatch(&occupant.id).await.unwrap(),
        DispatchOutcome::Dispatched
    );
    while harness.runner.started.load(Ordering::SeqCst) == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    assert_eq!(
        harness.dispatcher.dispatch(&queued.id).await.unwrap(),
        DispatchOutcome::Dispatched
    );
    assert_eq!(
        harness.dispatcher.dispatch(&overflow.id).await.unwrap(),
        DispatchOutcome::Rejected
    );

    // The rejected job is back in Pending, ready to be dispatched again.
    let job = harness.records.job(&overflow.id).await.unwrap();
    assert_eq!(job.status, JobStatus::Pending);

    harness.runner.gate.add_permits(16);
    harness.wait_terminal(&occupant.id).await;
    harness.wait_terminal(&queued.id).await;
}
