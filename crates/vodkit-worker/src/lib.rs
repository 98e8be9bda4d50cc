//! Transcode job orchestration.
//!
//! This crate provides:
//! - The job dispatcher and its Pending -> Dispatched compare-and-set
//! - A bounded worker pool with a non-blocking submit path
//! - The job execution body that drives Running -> Success/Failed
//! - The transcoder: download, FFmpeg ladder encode, inspect, upload

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod pool;
pub mod transcoder;

pub use config::{PoolConfig, TranscodeConfig};
pub use dispatcher::{DispatchOutcome, JobDispatcher};
pub use error::{WorkerError, WorkerResult};
pub use executor::JobExecutor;
pub use pool::{JobHandler, SubmitError, WorkerPool};
pub use transcoder::Transcoder;
