//! Offline document queue for Lighthouse.
//!
//! Documents scanned without connectivity are encrypted and held in a
//! single queue key. A [`QueueWorker`] drains the queue through a
//! [`DocumentAnalyzer`] when connectivity returns or a retry is requested.
//! A [`SyncLease`] keeps two execution contexts from draining at once.

pub mod analyzer;
pub mod config;
pub mod error;
pub mod item;
pub mod lease;
pub mod offline_queue;
pub mod worker;

pub use analyzer::{DocumentAnalysis, DocumentAnalyzer};
pub use config::QueueConfig;
pub use error::{AnalysisError, QueueError, QueueResult};
pub use item::{ItemStatus, QueueStats, QueuedItem};
pub use lease::SyncLease;
pub use offline_queue::{CompletedAnalysis, DrainSummary, OfflineQueue};
pub use worker::{create_queue_worker, ConnectivitySignal, QueueCommand, QueueHandle, QueueWorker};
