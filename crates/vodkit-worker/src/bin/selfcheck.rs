use std::path::Path;

use vodkit_media::check_ffmpeg;
use vodkit_storage::S3ObjectStore;
use vodkit_worker::{PoolConfig, TranscodeConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = TranscodeConfig::from_env();
    let pool = PoolConfig::from_env();

    println!(
        "vodkit-selfcheck: work_root={} workers={} queue_depth={}",
        config.work_root.display(),
        pool.workers,
        pool.queue_depth
    );

    ensure_workdir(&config.work_root).await?;

    let ffmpeg = check_ffmpeg().map_err(|e| anyhow::anyhow!("ffmpeg check failed: {}", e))?;
    println!("vodkit-selfcheck: ffmpeg at {}", ffmpeg.display());

    let store = S3ObjectStore::from_env()
        .map_err(|e| anyhow::anyhow!("object store config invalid: {}", e))?;
    store
        .ensure_bucket(&config.output_bucket)
        .await
        .map_err(|e| anyhow::anyhow!("bucket check failed: {}", e))?;
    println!("vodkit-selfcheck: bucket {} reachable", config.output_bucket);

    println!("vodkit-selfcheck: ok");
    Ok(())
}

async fn ensure_workdir<P: AsRef<Path>>(path: P) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(path.as_ref()).await?;
    Ok(())
}
