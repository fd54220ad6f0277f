//! Offline queue configuration.

use crate::error::{QueueError, QueueResult};
use serde::{Deserialize, Serialize};

/// Tuning for the offline queue and its drain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Attempts after which an item is skipped permanently.
    pub max_attempts: u32,

    /// Items older than this are evicted on read, whatever their status.
    pub retention_secs: u64,

    /// A lease older than this is treated as abandoned.
    pub lease_stale_secs: u64,

    /// Permanently failed items kept for diagnostics; oldest evicted first.
    pub max_failed_retained: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retention_secs: 7 * 24 * 60 * 60, // 7 days
            lease_stale_secs: 5 * 60,
            max_failed_retained: 25,
        }
    }
}

impl QueueConfig {
    pub fn validate(&self) -> QueueResult<()> {
        if self.max_attempts == 0 {
            return Err(QueueError::Config("max_attempts must be at least 1".into()));
        }
        if self.retention_secs == 0 {
            return Err(QueueError::Config("retention_secs must be positive".into()));
        }
        if self.lease_stale_secs == 0 {
            return Err(QueueError::Config("lease_stale_secs must be positive".into()));
        }
        Ok(())
    }

    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.retention_secs.min(i64::MAX as u64) as i64)
    }

    pub fn lease_staleness(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.lease_stale_secs.min(i64::MAX as u64) as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = QueueConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.retention(), chrono::Duration::days(7));
        assert_eq!(config.lease_staleness(), chrono::Duration::minutes(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: QueueConfig = serde_json::from_str(r#"{"max_attempts": 5}"#).unwrap();
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.max_failed_retained, 25);
    }

    #[test]
    fn zero_values_are_invalid() {
        for config in [
            QueueConfig { max_attempts: 0, ..QueueConfig::default() },
            QueueConfig { retention_secs: 0, ..QueueConfig::default() },
            QueueConfig { lease_stale_secs: 0, ..QueueConfig::default() },
        ] {
            assert!(matches!(config.validate(), Err(QueueError::Config(_))));
        }
    }
}
