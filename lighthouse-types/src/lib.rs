//! Shared domain types for the Lighthouse data-protection core.
//!
//! - [`StorageKey`]: the logical key namespace of the persistent store
//! - [`UserRecord`]: the sensitive intake record and its identifier-like fields
//! - [`MemorialRecord`]: the single non-identifying record that survives a scrub

mod keys;
mod memorial;
mod record;

pub use keys::{StorageKey, ERASURE_EXCLUSIONS};
pub use memorial::{
    format_completion_date, MemorialRecord, FALLBACK_DISPLAY_NAME, HONORED_MESSAGE,
};
pub use record::{ScannedDocument, UserRecord, SENSITIVE_FIELDS};
