//! Encrypted queue of document submissions made while offline.
//!
//! The whole queue lives under one storage key. Every read-modify-write of
//! that key happens under `bookkeeping`, which is never held across an
//! analyzer call, so an `enqueue` racing a drain is not lost.

use crate::analyzer::{DocumentAnalysis, DocumentAnalyzer};
use crate::config::QueueConfig;
use crate::error::{QueueError, QueueResult};
use crate::item::{QueueStats, QueuedItem};
use crate::lease::{LeaseKeeper, SyncLease};
use chrono::{DateTime, Utc};
use lighthouse_storage::SecureStore;
use lighthouse_types::StorageKey;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Result of analysing one queued document.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedAnalysis {
    pub item_id: Uuid,
    pub file_name: String,
    pub analysis: DocumentAnalysis,
}

/// Outcome of one [`OfflineQueue::drain`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrainSummary {
    pub succeeded: usize,
    /// Items that failed this drain, plus exhausted items skipped by it.
    pub failed: usize,
    /// Items skipped because they are out of attempts.
    pub exhausted: usize,
    /// Another context held the lease; nothing was submitted.
    pub lease_held: bool,
    pub analyses: Vec<CompletedAnalysis>,
}

impl DrainSummary {
    fn lease_held() -> Self {
        Self {
            lease_held: true,
            ..Self::default()
        }
    }
}

pub struct OfflineQueue {
    store: Arc<SecureStore>,
    config: QueueConfig,
    lease: LeaseKeeper,
    bookkeeping: Mutex<()>,
}

const QUEUE_KEY: StorageKey = StorageKey::OfflineScanQueue;

impl OfflineQueue {
    pub fn new(store: Arc<SecureStore>, config: QueueConfig) -> QueueResult<Self> {
        config.validate()?;
        let lease = LeaseKeeper::new(Arc::clone(store.backend()), config.lease_staleness());
        Ok(Self {
            store,
            config,
            lease,
            bookkeeping: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Encrypts `payload` and appends it to the queue.
    pub async fn enqueue(
        &self,
        file_name: &str,
        mime_type: &str,
        payload: &[u8],
    ) -> QueueResult<QueuedItem> {
        let encrypted_payload = self.store.seal_bytes(payload).await?;

        let _guard = self.bookkeeping.lock().await;
        let mut items = self.load_items().await?;

        let item = QueuedItem::new(file_name, mime_type, encrypted_payload, Utc::now());
        items.push(item.clone());
        self.save_items(&items).await?;

        info!("queued {} for later analysis ({} in queue)", item.id, items.len());
        Ok(item)
    }

    /// Submits every eligible item, in queue order, to `analyzer`.
    ///
    /// Each item is marked `Syncing` with its attempt counted before the
    /// analyzer is called. Success removes the item; failure marks it
    /// `Failed` and moves on.
    ///
    /// A success is reported even if the item cannot then be removed. It
    /// stays `Syncing` and is submitted again on the next drain.
    pub async fn drain(&self, analyzer: &dyn DocumentAnalyzer) -> QueueResult<DrainSummary> {
        let Some(_lease) = self.lease.try_acquire()? else {
            info!("drain skipped, sync lease held elsewhere");
            return Ok(DrainSummary::lease_held());
        };

        let mut summary = DrainSummary::default();
        let eligible: Vec<Uuid> = {
            let _guard = self.bookkeeping.lock().await;
            let items = self.load_items().await?;
            let mut eligible = Vec::with_capacity(items.len());
            for item in &items {
                if item.is_exhausted(self.config.max_attempts) {
                    summary.exhausted += 1;
                    summary.failed += 1;
                } else {
                    eligible.push(item.id);
                }
            }
            eligible
        };

        if eligible.is_empty() {
            debug!("nothing to drain");
            return Ok(summary);
        }
        info!("draining {} queued items", eligible.len());

        for id in eligible {
            let Some(item) = self.begin_attempt(id).await? else {
                debug!("item {id} left the queue before submission");
                continue;
            };

            match self.submit(&item, analyzer).await {
                Ok(analysis) => {
                    summary.succeeded += 1;
                    summary.analyses.push(CompletedAnalysis {
                        item_id: id,
                        file_name: item.file_name,
                        analysis,
                    });
                    match self.remove_item(id).await {
                        Ok(_) => debug!("item {id} analysed and removed"),
                        Err(e) => warn!("item {id} analysed but still queued: {e}"),
                    }
                }
                Err(e) => {
                    let permanent = matches!(e, QueueError::Crypto(_));
                    warn!(
                        "item {id} failed on attempt {}{}: {e}",
                        item.attempts,
                        if permanent { " (payload unreadable)" } else { "" }
                    );
                    self.record_failure(id, e.to_string(), permanent).await?;
                    summary.failed += 1;
                }
            }
        }

        info!(
            "drain finished: {} succeeded, {} failed ({} exhausted)",
            summary.succeeded, summary.failed, summary.exhausted
        );
        Ok(summary)
    }

    pub async fn get_queue_size(&self) -> QueueResult<usize> {
        Ok(self.items().await?.len())
    }

    /// All retained items, after eviction.
    pub async fn items(&self) -> QueueResult<Vec<QueuedItem>> {
        let _guard = self.bookkeeping.lock().await;
        self.load_items().await
    }

    pub async fn stats(&self) -> QueueResult<QueueStats> {
        let items = self.items().await?;
        Ok(QueueStats::from_items(&items, self.config.max_attempts))
    }

    /// Dismisses one item, typically a retained failure. Returns whether it existed.
    pub async fn discard_item(&self, id: Uuid) -> QueueResult<bool> {
        self.remove_item(id).await
    }

    pub async fn clear(&self) -> QueueResult<()> {
        let _guard = self.bookkeeping.lock().await;
        self.store.remove(QUEUE_KEY.as_str())?;
        info!("offline queue cleared");
        Ok(())
    }

    /// The lease currently recorded, fresh or not.
    pub fn lease(&self) -> QueueResult<Option<SyncLease>> {
        self.lease.current()
    }

    async fn submit(
        &self,
        item: &QueuedItem,
        analyzer: &dyn DocumentAnalyzer,
    ) -> QueueResult<DocumentAnalysis> {
        let payload = self.store.open_bytes(&item.encrypted_payload).await?;
        analyzer
            .analyze(&payload, &item.mime_type)
            .await
            .map_err(|e| QueueError::ItemFailed {
                id: item.id,
                reason: e.to_string(),
            })
    }

    async fn begin_attempt(&self, id: Uuid) -> QueueResult<Option<QueuedItem>> {
        let _guard = self.bookkeeping.lock().await;
        let mut items = self.load_items().await?;
        let Some(item) = items.iter_mut().find(|item| item.id == id) else {
            return Ok(None);
        };
        item.begin_attempt();
        let snapshot = item.clone();
        self.save_items(&items).await?;
        Ok(Some(snapshot))
    }

    async fn record_failure(&self, id: Uuid, reason: String, permanent: bool) -> QueueResult<()> {
        let _guard = self.bookkeeping.lock().await;
        let mut items = self.load_items().await?;
        if let Some(item) = items.iter_mut().find(|item| item.id == id) {
            item.record_failure(reason);
            if permanent {
                item.attempts = item.attempts.max(self.config.max_attempts);
            }
            self.save_items(&items).await?;
        }
        Ok(())
    }

    async fn remove_item(&self, id: Uuid) -> QueueResult<bool> {
        let _guard = self.bookkeeping.lock().await;
        let mut items = self.load_items().await?;
        let before = items.len();
        items.retain(|item| item.id != id);
        if items.len() == before {
            return Ok(false);
        }
        self.save_items(&items).await?;
        Ok(true)
    }

    /// Reads the queue and applies eviction, persisting if anything went.
    /// Callers hold `bookkeeping`.
    async fn load_items(&self) -> QueueResult<Vec<QueuedItem>> {
        let mut items: Vec<QueuedItem> = self.store.load_or_default(QUEUE_KEY.as_str()).await?;
        let evicted = self.evict(&mut items, Utc::now());
        if evicted > 0 {
            info!("evicted {evicted} queued items past retention");
            self.save_items(&items).await?;
        }
        Ok(items)
    }

    async fn save_items(&self, items: &[QueuedItem]) -> QueueResult<()> {
        if items.is_empty() {
            self.store.remove(QUEUE_KEY.as_str())?;
        } else {
            self.store.save(QUEUE_KEY.as_str(), items).await?;
        }
        Ok(())
    }

    fn evict(&self, items: &mut Vec<QueuedItem>, now: DateTime<Utc>) -> usize {
        let before = items.len();
        let retention = self.config.retention();
        items.retain(|item| !item.is_expired(now, retention));

        let max_attempts = self.config.max_attempts;
        let mut exhausted: Vec<(DateTime<Utc>, Uuid)> = items
            .iter()
            .filter(|item| item.is_exhausted(max_attempts))
            .map(|item| (item.timestamp, item.id))
            .collect();
        if exhausted.len() > self.config.max_failed_retained {
            exhausted.sort();
            let excess = exhausted.len() - self.config.max_failed_retained;
            let oldest: Vec<Uuid> = exhausted.into_iter().take(excess).map(|(_, id)| id).collect();
            items.retain(|item| !oldest.contains(&item.id));
        }

        before - items.len()
    }
}
