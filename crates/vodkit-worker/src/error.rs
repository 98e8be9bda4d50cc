//! Worker error types.

use thiserror::Error;

use vodkit_media::MediaError;
use vodkit_records::RecordError;
use vodkit_storage::StorageError;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Transcode process failed with exit code {0}")]
    ProcessFailed(i32),

    #[error("Missing video asset")]
    MissingAsset,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Record store error: {0}")]
    Records(#[from] RecordError),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
