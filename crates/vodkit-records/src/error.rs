//! Record store error types.

use thiserror::Error;

pub type RecordResult<T> = Result<T, RecordError>;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl RecordError {
    pub fn transaction_failed(msg: impl Into<String>) -> Self {
        Self::TransactionFailed(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}
