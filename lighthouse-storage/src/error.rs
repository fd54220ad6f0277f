//! Storage error types.

use thiserror::Error;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] duckdb::Error),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("storage quota exceeded: write would use {used} of {quota} bytes")]
    QuotaExceeded { used: usize, quota: usize },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The value exists but cannot be decrypted or decoded.
    #[error("value under '{key}' is unrecoverable: {reason}")]
    Unrecoverable { key: String, reason: String },
}
