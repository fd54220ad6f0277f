//! Device-local storage for Lighthouse.
//!
//! # Architecture
//!
//! - [`KeyValueStore`] is the raw persistent-store surface: synchronous,
//!   string keyed, no confidentiality, no multi-key transactions
//! - [`MemoryStore`] backs session-scoped state and tests, with a capacity
//!   ceiling like the platform store it stands in for
//! - [`DuckDbStore`] is the durable single-table store
//! - [`SecureStore`] layers transparent encryption over any backend and
//!   migrates legacy plaintext values on first read

mod duckdb_store;
mod error;
mod kv;
mod secure_store;
mod stored_value;

pub use duckdb_store::DuckDbStore;
pub use error::{StorageError, StorageResult};
pub use kv::{KeyValueStore, MemoryStore, DEFAULT_QUOTA_BYTES};
pub use secure_store::{SaveOutcome, SecureStore};
pub use stored_value::{StoredValue, ValueOrigin};
