//! Logical key namespace of the device-local persistent store.

use std::fmt;

/// Keys that no erasure enumeration may ever include.
pub const ERASURE_EXCLUSIONS: &[&str] = &["memorial"];

/// A well-known key in the persistent store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    /// The encrypted [`UserRecord`](crate::UserRecord).
    UserRecord,
    /// Scanned-document analysis results.
    DocumentScans,
    /// The user's task checklist.
    TaskList,
    /// Draft outline of the memorial service.
    ServiceOutline,
    /// Backing key of the offline scan queue.
    OfflineScanQueue,
    /// Drain lease marker.
    SyncLease,
    /// Memorial record and scrub phase marker. Never erased.
    Memorial,
}

impl StorageKey {
    pub const ALL: [StorageKey; 7] = [
        StorageKey::UserRecord,
        StorageKey::DocumentScans,
        StorageKey::TaskList,
        StorageKey::ServiceOutline,
        StorageKey::OfflineScanQueue,
        StorageKey::SyncLease,
        StorageKey::Memorial,
    ];

    /// Every key holding user data or queue state, in erasure order.
    pub const SENSITIVE: [StorageKey; 6] = [
        StorageKey::UserRecord,
        StorageKey::DocumentScans,
        StorageKey::TaskList,
        StorageKey::ServiceOutline,
        StorageKey::OfflineScanQueue,
        StorageKey::SyncLease,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            StorageKey::UserRecord => "user-record",
            StorageKey::DocumentScans => "document-scans",
            StorageKey::TaskList => "task-list",
            StorageKey::ServiceOutline => "service-outline",
            StorageKey::OfflineScanQueue => "offline-scan-queue",
            StorageKey::SyncLease => "sync-lease",
            StorageKey::Memorial => "memorial",
        }
    }

    /// Resolves a raw store key back to a well-known key.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == key)
    }

    /// Whether a raw key may be erased by a scrub.
    pub fn is_erasable(key: &str) -> bool {
        !ERASURE_EXCLUSIONS.contains(&key)
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
