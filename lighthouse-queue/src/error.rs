//! Offline queue error types.

use thiserror::Error;
use uuid::Uuid;

/// Result type for queue operations.
pub type QueueResult<T> = Result<T, QueueError>;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("storage error: {0}")]
    Storage(#[from] lighthouse_storage::StorageError),

    #[error("crypto error: {0}")]
    Crypto(#[from] lighthouse_crypto::CryptoError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("item {id} failed: {reason}")]
    ItemFailed { id: Uuid, reason: String },

    #[error("invalid queue configuration: {0}")]
    Config(String),

    #[error("queue worker not running")]
    WorkerStopped,
}

/// Failure reported by the document-analysis collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("network unavailable: {0}")]
    Network(String),

    #[error("analysis timed out")]
    Timeout,

    #[error("analysis rejected: {0}")]
    Rejected(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_failed_names_the_item() {
        let id = Uuid::nil();
        let err = QueueError::ItemFailed {
            id,
            reason: AnalysisError::Timeout.to_string(),
        };
        assert_eq!(
            err.to_string(),
            "item 00000000-0000-0000-0000-000000000000 failed: analysis timed out"
        );
    }

    #[test]
    fn storage_errors_convert() {
        let err: QueueError = lighthouse_storage::StorageError::QuotaExceeded {
            used: 10,
            quota: 5,
        }
        .into();
        assert!(matches!(err, QueueError::Storage(_)));
    }
}
