//! Cross-context mutual exclusion for drains.
//!
//! The lease is not sensitive and is kept as plain JSON directly on the
//! backend, so checking and setting it needs no suspension point. A guard
//! releases it on every exit path of a drain.

use crate::error::QueueResult;
use chrono::{DateTime, Utc};
use lighthouse_storage::KeyValueStore;
use lighthouse_types::StorageKey;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};
use uuid::Uuid;

/// Marker that some execution context is draining the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncLease {
    pub holder: Uuid,
    pub acquired_at: DateTime<Utc>,
}

impl SyncLease {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            holder: Uuid::new_v4(),
            acquired_at: now,
        }
    }

    /// A lease is stale once it is older than `staleness`. One stamped
    /// further in the future than that is also stale (clock moved back).
    pub fn is_stale(&self, now: DateTime<Utc>, staleness: chrono::Duration) -> bool {
        let age = now.signed_duration_since(self.acquired_at);
        age >= staleness || age <= -staleness
    }
}

pub(crate) struct LeaseKeeper {
    backend: Arc<dyn KeyValueStore>,
    gate: Arc<Mutex<()>>,
    staleness: chrono::Duration,
}

impl LeaseKeeper {
    pub(crate) fn new(backend: Arc<dyn KeyValueStore>, staleness: chrono::Duration) -> Self {
        Self {
            backend,
            gate: Arc::new(Mutex::new(())),
            staleness,
        }
    }

    /// Takes the lease unless a fresh one is already held.
    pub(crate) fn try_acquire(&self) -> QueueResult<Option<LeaseGuard>> {
        let _gate = self.gate.lock().unwrap_or_else(|p| p.into_inner());
        let now = Utc::now();

        if let Some(existing) = read_lease(self.backend.as_ref())? {
            if !existing.is_stale(now, self.staleness) {
                debug!("sync lease held by {}", existing.holder);
                return Ok(None);
            }
            warn!(
                "ignoring abandoned sync lease from {} (acquired {})",
                existing.holder, existing.acquired_at
            );
        }

        let lease = SyncLease::new(now);
        self.backend
            .set(StorageKey::SyncLease.as_str(), &serde_json::to_string(&lease)?)?;
        debug!("sync lease acquired by {}", lease.holder);

        Ok(Some(LeaseGuard {
            backend: Arc::clone(&self.backend),
            gate: Arc::clone(&self.gate),
            holder: lease.holder,
        }))
    }

    pub(crate) fn current(&self) -> QueueResult<Option<SyncLease>> {
        read_lease(self.backend.as_ref())
    }
}

fn read_lease(backend: &dyn KeyValueStore) -> QueueResult<Option<SyncLease>> {
    let Some(raw) = backend.get(StorageKey::SyncLease.as_str())? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(lease) => Ok(Some(lease)),
        Err(e) => {
            warn!("unreadable sync lease, treating as absent: {e}");
            Ok(None)
        }
    }
}

/// Clears the lease on drop, provided it still belongs to this holder.
pub(crate) struct LeaseGuard {
    backend: Arc<dyn KeyValueStore>,
    gate: Arc<Mutex<()>>,
    holder: Uuid,
}

impl Drop for LeaseGuard {
    fn drop(&mut self) {
        let _gate = self.gate.lock().unwrap_or_else(|p| p.into_inner());
        match read_lease(self.backend.as_ref()) {
            Ok(Some(lease)) if lease.holder == self.holder => {
                if let Err(e) = self.backend.remove(StorageKey::SyncLease.as_str()) {
                    warn!("failed to release sync lease: {e}");
                } else {
                    debug!("sync lease released by {}", self.holder);
                }
            }
            Ok(_) => debug!("sync lease already taken over, leaving it"),
            Err(e) => warn!("failed to read sync lease on release: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lighthouse_storage::MemoryStore;

    fn keeper(backend: Arc<MemoryStore>) -> LeaseKeeper {
        LeaseKeeper::new(backend, chrono::Duration::minutes(5))
    }

    #[test]
    fn second_acquire_is_refused_until_release() {
        let backend = Arc::new(MemoryStore::new());
        let keeper = keeper(backend.clone());

        let guard = keeper.try_acquire().unwrap().expect("first acquire");
        assert!(keeper.try_acquire().unwrap().is_none());

        drop(guard);
        assert!(backend.get("sync-lease").unwrap().is_none());
        assert!(keeper.try_acquire().unwrap().is_some());
    }

    #[test]
    fn stale_lease_is_taken_over() {
        let backend = Arc::new(MemoryStore::new());
        let stale = SyncLease::new(Utc::now() - chrono::Duration::minutes(6));
        backend
            .set("sync-lease", &serde_json::to_string(&stale).unwrap())
            .unwrap();

        let keeper = keeper(backend);
        let _guard = keeper.try_acquire().unwrap().expect("stale lease ignored");
        assert_ne!(keeper.current().unwrap().unwrap().holder, stale.holder);
    }

    #[test]
    fn release_leaves_a_foreign_lease_alone() {
        let backend = Arc::new(MemoryStore::new());
        let keeper = keeper(backend.clone());
        let guard = keeper.try_acquire().unwrap().unwrap();

        let foreign = SyncLease::new(Utc::now());
        backend
            .set("sync-lease", &serde_json::to_string(&foreign).unwrap())
            .unwrap();
        drop(guard);

        assert_eq!(keeper.current().unwrap(), Some(foreign));
    }

    #[test]
    fn garbage_lease_is_treated_as_absent() {
        let backend = Arc::new(MemoryStore::new());
        backend.set("sync-lease", "not json").unwrap();
        assert!(keeper(backend).try_acquire().unwrap().is_some());
    }

    #[test]
    fn staleness_window() {
        let now = Utc::now();
        let five = chrono::Duration::minutes(5);
        let lease = SyncLease::new(now - chrono::Duration::minutes(4));
        assert!(!lease.is_stale(now, five));
        assert!(lease.is_stale(now + chrono::Duration::minutes(2), five));
        assert!(SyncLease::new(now + chrono::Duration::minutes(10)).is_stale(now, five));
    }
}
