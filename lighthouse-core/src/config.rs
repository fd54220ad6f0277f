//! Runtime configuration.

use crate::error::{CoreError, CoreResult};
use lighthouse_crypto::KdfParams;
use lighthouse_queue::QueueConfig;
use lighthouse_storage::DEFAULT_QUOTA_BYTES;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LighthouseConfig {
    /// DuckDB file for the persistent store. `None` keeps everything in
    /// memory, bounded by `quota_bytes`.
    pub database_path: Option<PathBuf>,

    /// Capacity of the in-memory persistent store.
    pub quota_bytes: usize,

    pub kdf: KdfParams,

    pub queue: QueueConfig,

    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for LighthouseConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            quota_bytes: DEFAULT_QUOTA_BYTES,
            kdf: KdfParams::default(),
            queue: QueueConfig::default(),
            log_filter: "info".to_string(),
        }
    }
}

impl LighthouseConfig {
    /// Default config persisting to the DuckDB file at `path`.
    pub fn with_database(path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> CoreResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> CoreResult<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.quota_bytes == 0 {
            return Err(CoreError::Config("quota_bytes must be positive".into()));
        }
        if self.log_filter.trim().is_empty() {
            return Err(CoreError::Config("log_filter must not be empty".into()));
        }
        self.kdf.validate()?;
        self.queue.validate()?;
        Ok(())
    }
}
