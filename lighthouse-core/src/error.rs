//! Runtime error types.

use thiserror::Error;

/// Result type for runtime operations.
pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("crypto error: {0}")]
    Crypto(#[from] lighthouse_crypto::CryptoError),

    #[error("storage error: {0}")]
    Storage(#[from] lighthouse_storage::StorageError),

    #[error("queue error: {0}")]
    Queue(#[from] lighthouse_queue::QueueError),

    #[error("scrub error: {0}")]
    Scrub(#[from] lighthouse_scrub::ScrubError),
}
