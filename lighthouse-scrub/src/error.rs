//! Scrub error types.

use crate::state::ScrubPhase;
use thiserror::Error;

/// Result type for scrub operations.
pub type ScrubResult<T> = Result<T, ScrubError>;

#[derive(Debug, Error)]
pub enum ScrubError {
    #[error("storage error: {0}")]
    Storage(#[from] lighthouse_storage::StorageError),

    /// Authoritative erasure left data behind. The phase stays
    /// `MemorialCommitted` so the erasure can be retried.
    #[error("erasure incomplete, {} key(s) remain: {}", .keys.len(), .keys.join(", "))]
    Incomplete { keys: Vec<String> },

    /// The `memorial` key cannot be decrypted or decoded. The phase is
    /// unknown until the user clears it with `clear_memorial`.
    #[error("scrub marker is unreadable: {reason}")]
    MemorialUnreadable { reason: String },

    #[error("{operation} is not allowed in phase {}", .phase.map_or("none", ScrubPhase::as_str))]
    OutOfOrder {
        operation: &'static str,
        phase: Option<ScrubPhase>,
    },
}
