//! Queued items and their lifecycle.

use chrono::{DateTime, Utc};
use lighthouse_crypto::EncryptedEnvelope;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Pending,
    /// Persisted before the analyzer call. Seen at drain start only after a
    /// crash, in which case the item is retried.
    Syncing,
    Failed,
}

/// A document submission waiting for connectivity.
///
/// The payload is only ever held as an envelope; it is opened just before
/// submission and never written back in the clear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedItem {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub file_name: String,
    pub mime_type: String,
    pub encrypted_payload: EncryptedEnvelope,
    pub status: ItemStatus,
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl QueuedItem {
    pub fn new(
        file_name: &str,
        mime_type: &str,
        encrypted_payload: EncryptedEnvelope,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: now,
            file_name: file_name.to_string(),
            mime_type: mime_type.to_string(),
            encrypted_payload,
            status: ItemStatus::Pending,
            attempts: 0,
            last_error: None,
        }
    }

    pub fn is_exhausted(&self, max_attempts: u32) -> bool {
        self.attempts >= max_attempts
    }

    pub fn is_expired(&self, now: DateTime<Utc>, retention: chrono::Duration) -> bool {
        now.signed_duration_since(self.timestamp) > retention
    }

    pub(crate) fn begin_attempt(&mut self) {
        self.status = ItemStatus::Syncing;
        self.attempts = self.attempts.saturating_add(1);
    }

    pub(crate) fn record_failure(&mut self, reason: String) {
        self.status = ItemStatus::Failed;
        self.last_error = Some(reason);
    }
}

/// Point-in-time counts over the queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub total: usize,
    pub pending: usize,
    pub syncing: usize,
    /// Failed but still eligible for retry.
    pub failed: usize,
    /// Out of attempts; retained for diagnostics only.
    pub exhausted: usize,
}

impl QueueStats {
    pub fn from_items(items: &[QueuedItem], max_attempts: u32) -> Self {
        let mut stats = Self {
            total: items.len(),
            ..Self::default()
        };
        for item in items {
            if item.is_exhausted(max_attempts) {
                stats.exhausted += 1;
                continue;
            }
            match item.status {
                ItemStatus::Pending => stats.pending += 1,
                ItemStatus::Syncing => stats.syncing += 1,
                ItemStatus::Failed => stats.failed += 1,
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn envelope() -> EncryptedEnvelope {
        EncryptedEnvelope {
            ciphertext: "Y2lwaGVydGV4dA==".into(),
            iv: "AAAAAAAAAAAAAAAA".into(),
            salt: "AAAAAAAAAAAAAAAAAAAAAA==".into(),
        }
    }

    fn item() -> QueuedItem {
        QueuedItem::new(
            "State_ID_Card.pdf",
            "application/pdf",
            envelope(),
            Utc::now(),
        )
    }

    #[test]
    fn new_item_is_pending_with_no_attempts() {
        let item = item();
        assert_eq!(item.status, ItemStatus::Pending);
        assert_eq!(item.attempts, 0);
        assert_eq!(item.last_error, None);
    }

    #[test]
    fn attempts_only_increase() {
        let mut item = item();
        item.begin_attempt();
        item.record_failure("offline".into());
        item.begin_attempt();
        assert_eq!(item.attempts, 2);
        assert_eq!(item.status, ItemStatus::Syncing);
        assert_eq!(item.last_error.as_deref(), Some("offline"));
    }

    #[test]
    fn expiry_is_relative_to_timestamp() {
        let item = item();
        let week = chrono::Duration::days(7);
        assert!(!item.is_expired(item.timestamp + chrono::Duration::days(6), week));
        assert!(item.is_expired(item.timestamp + chrono::Duration::days(8), week));
    }

    #[test]
    fn serializes_camel_case_without_plaintext() {
        let json = serde_json::to_value(item()).unwrap();
        assert!(json.get("fileName").is_some());
        assert!(json.get("encryptedPayload").is_some());
        assert!(json.get("lastError").is_none());
        assert_eq!(json["status"], "pending");
    }

    #[test]
    fn stats_separate_exhausted_from_retryable() {
        let mut failed = item();
        failed.begin_attempt();
        failed.record_failure("x".into());
        let mut exhausted = failed.clone();
        exhausted.attempts = 3;

        let stats = QueueStats::from_items(&[item(), failed, exhausted], 3);
        assert_eq!(
            stats,
            QueueStats {
                total: 3,
                pending: 1,
                syncing: 0,
                failed: 1,
                exhausted: 1,
            }
        );
    }
}
