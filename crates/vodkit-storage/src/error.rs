//! Storage error types.

use thiserror::Error;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to download object {key}: {message}")]
    DownloadFailed { key: String, message: String },

    #[error("Failed to upload object {key}: {message}")]
    UploadFailed { key: String, message: String },

    #[error("Bucket operation failed for {bucket}: {message}")]
    BucketFailed { bucket: String, message: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    pub fn download_failed(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DownloadFailed {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn upload_failed(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UploadFailed {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn bucket_failed(bucket: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BucketFailed {
            bucket: bucket.into(),
            message: message.into(),
        }
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }
}
