//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

use vodkit_models::RenditionLadder;

/// Transcoder configuration.
#[derive(Debug, Clone)]
pub struct TranscodeConfig {
    /// Bucket receiving the HLS output tree
    pub output_bucket: String,
    /// Key prefix for outputs, always ending in `/`
    pub output_prefix: String,
    /// Public base URL for playback, always ending in `/`
    pub playback_base: String,
    /// Root directory under which per-job working directories are created
    pub work_root: PathBuf,
    /// The rendition ladder to produce per job
    pub ladder: RenditionLadder,
    /// Hard timeout for the external process; None runs unbounded
    pub process_timeout: Option<Duration>,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            output_bucket: "media".to_string(),
            output_prefix: "vod/".to_string(),
            playback_base: "/vod/".to_string(),
            work_root: PathBuf::from("/tmp/vodkit"),
            ladder: RenditionLadder::default(),
            process_timeout: None,
        }
    }
}

impl TranscodeConfig {
    /// Create config from environment variables, defaulting unset values.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            output_bucket: std::env::var("VODKIT_OUTPUT_BUCKET")
                .unwrap_or(defaults.output_bucket),
            output_prefix: ensure_suffix(
                std::env::var("VODKIT_OUTPUT_PREFIX").unwrap_or(defaults.output_prefix),
                "/",
            ),
            playback_base: ensure_suffix(
                std::env::var("VODKIT_PLAYBACK_BASE").unwrap_or(defaults.playback_base),
                "/",
            ),
            work_root: std::env::var("VODKIT_WORK_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_root),
            ladder: defaults.ladder,
            process_timeout: std::env::var("VODKIT_PROCESS_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs),
        }
    }

    /// Replace the rendition ladder.
    pub fn with_ladder(mut self, ladder: RenditionLadder) -> Self {
        self.ladder = ladder;
        self
    }
}

/// Worker pool sizing.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Fixed number of worker tasks
    pub workers: usize,
    /// Bounded queue depth; submissions beyond it are rejected
    pub queue_depth: usize,
    /// How long shutdown waits for in-flight jobs
    pub shutdown_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            queue_depth: 4,
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

impl PoolConfig {
    /// Create config from environment variables, defaulting unset values.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            workers: std::env::var("VODKIT_POOL_WORKERS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.workers),
            queue_depth: std::env::var("VODKIT_POOL_QUEUE_DEPTH")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.queue_depth),
            shutdown_timeout: Duration::from_secs(
                std::env::var("VODKIT_POOL_SHUTDOWN_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }
}

fn ensure_suffix(value: String, suffix: &str) -> String {
    if value.is_empty() {
        return suffix.to_string();
    }
    if value.ends_with(suffix) {
        value
    } else {
        format!("{}{}", value, suffix)
    }
}
