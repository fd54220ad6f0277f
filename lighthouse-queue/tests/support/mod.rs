//! Shared helpers: a cheap secure store and scripted analyzers.
#![allow(dead_code)]

use async_trait::async_trait;
use lighthouse_crypto::{AppSecret, EncryptionProvider, KdfParams};
use lighthouse_queue::{
    AnalysisError, DocumentAnalysis, DocumentAnalyzer, OfflineQueue, QueueConfig, QueuedItem,
};
use lighthouse_storage::{MemoryStore, SecureStore};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub const POLICY: &[u8] = b"%PDF-1.4 Life Insurance Policy. Policy Number: LI-8842-1193";
pub const WILL: &[u8] = b"%PDF-1.4 Last Will and Testament of Jordan Vance";
pub const STATE_ID: &[u8] = b"%PDF-1.4 State ID Card. ID: D123-4567-8901";

pub fn provider() -> EncryptionProvider {
    EncryptionProvider::new(KdfParams {
        memory_kib: 64,
        iterations: 1,
        parallelism: 1,
    })
    .unwrap()
}

pub fn secure_store(backend: Arc<MemoryStore>) -> Arc<SecureStore> {
    Arc::new(SecureStore::new(
        backend,
        provider(),
        AppSecret::new("device-app-secret"),
    ))
}

/// A queue over a fresh in-memory backend, returned alongside both layers.
pub fn queue_with(config: QueueConfig) -> (Arc<MemoryStore>, Arc<SecureStore>, Arc<OfflineQueue>) {
    let backend = Arc::new(MemoryStore::new());
    let store = secure_store(backend.clone());
    let queue = Arc::new(OfflineQueue::new(store.clone(), config).unwrap());
    (backend, store, queue)
}

pub fn queue() -> (Arc<MemoryStore>, Arc<SecureStore>, Arc<OfflineQueue>) {
    queue_with(QueueConfig::default())
}

pub async fn enqueue_fixtures(queue: &OfflineQueue) -> Vec<QueuedItem> {
    let mut items = Vec::new();
    for (name, bytes) in [
        ("Life_Insurance_Policy.pdf", POLICY),
        ("Last_Will_and_Testament.pdf", WILL),
        ("State_ID_Card.pdf", STATE_ID),
    ] {
        items.push(queue.enqueue(name, "application/pdf", bytes).await.unwrap());
    }
    items
}

/// Rewrites the persisted queue through `edit`, bypassing the queue itself.
pub async fn edit_persisted(store: &SecureStore, edit: impl FnOnce(&mut Vec<QueuedItem>)) {
    let mut items: Vec<QueuedItem> = store.load("offline-scan-queue").await.unwrap().unwrap();
    edit(&mut items);
    store.save("offline-scan-queue", &items).await.unwrap();
}

/// Succeeds for every payload and records what it was sent.
#[derive(Default)]
pub struct RecordingAnalyzer {
    pub received: Mutex<Vec<Vec<u8>>>,
}

impl RecordingAnalyzer {
    pub fn calls(&self) -> usize {
        self.received.lock().unwrap().len()
    }
}

#[async_trait]
impl DocumentAnalyzer for RecordingAnalyzer {
    async fn analyze(
        &self,
        payload: &[u8],
        mime_type: &str,
    ) -> Result<DocumentAnalysis, AnalysisError> {
        self.received.lock().unwrap().push(payload.to_vec());
        Ok(DocumentAnalysis(json!({
            "mimeType": mime_type,
            "bytes": payload.len(),
        })))
    }
}

/// Fails every call as if the network were down.
#[derive(Default)]
pub struct OfflineAnalyzer {
    pub calls: AtomicUsize,
}

impl OfflineAnalyzer {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentAnalyzer for OfflineAnalyzer {
    async fn analyze(&self, _: &[u8], _: &str) -> Result<DocumentAnalysis, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(AnalysisError::Network("connection refused".into()))
    }
}

/// Rejects one specific payload and accepts the rest.
pub struct RejectingAnalyzer {
    pub reject: &'static [u8],
}

#[async_trait]
impl DocumentAnalyzer for RejectingAnalyzer {
    async fn analyze(&self, payload: &[u8], _: &str) -> Result<DocumentAnalysis, AnalysisError> {
        if payload == self.reject {
            Err(AnalysisError::Rejected("unreadable scan".into()))
        } else {
            Ok(DocumentAnalysis(json!({ "ok": true })))
        }
    }
}

/// Blocks inside `analyze` until released, announcing when it is entered.
#[derive(Default)]
pub struct GatedAnalyzer {
    pub entered: Notify,
    pub release: Notify,
}

#[async_trait]
impl DocumentAnalyzer for GatedAnalyzer {
    async fn analyze(&self, _: &[u8], _: &str) -> Result<DocumentAnalysis, AnalysisError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(DocumentAnalysis(json!({ "ok": true })))
    }
}
