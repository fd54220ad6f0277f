//! Lighthouse data-protection core.
//!
//! [`DataProtection`] wires the pieces together at startup:
//! - checks the platform crypto and opens the persistent store
//! - migrates legacy plaintext values to encrypted envelopes
//! - settles any scrub interrupted by a previous crash
//! - builds the offline queue and, on request, its drain worker
//!
//! UI collaborators read and write through [`DataProtection::store`] and
//! never touch the cipher directly.

pub mod artifact_cache;
pub mod config;
pub mod error;
pub mod logging;

pub use artifact_cache::ArtifactCache;
pub use config::LighthouseConfig;
pub use error::{CoreError, CoreResult};
pub use logging::init_tracing;

use lighthouse_crypto::{AppSecret, EncryptionProvider};
use lighthouse_queue::{
    create_queue_worker, ConnectivitySignal, DocumentAnalyzer, DrainSummary, OfflineQueue,
    QueueHandle,
};
use lighthouse_scrub::{ResumeOutcome, ScrubProtocol};
use lighthouse_storage::{DuckDbStore, KeyValueStore, MemoryStore, SecureStore};
use lighthouse_types::StorageKey;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// A running queue worker.
pub struct QueueWorkerHandle {
    pub handle: QueueHandle,
    pub summaries: mpsc::Receiver<DrainSummary>,
    pub task: JoinHandle<()>,
}

pub struct DataProtection {
    config: LighthouseConfig,
    store: Arc<SecureStore>,
    session: Arc<MemoryStore>,
    queue: Arc<OfflineQueue>,
    scrub: ScrubProtocol,
    artifacts: Arc<ArtifactCache>,
    connectivity: ConnectivitySignal,
}

impl DataProtection {
    /// Starts the core with the platform-provided app secret.
    ///
    /// Fails if the crypto self-test fails or the store cannot be opened.
    /// A scrub that cannot be resumed is logged and left for the UI to retry.
    pub async fn start(config: LighthouseConfig, secret: AppSecret) -> CoreResult<Self> {
        config.validate()?;
        if secret.is_empty() {
            return Err(CoreError::Config("app secret must not be empty".into()));
        }

        let provider = EncryptionProvider::new(config.kdf)?;

        let backend: Arc<dyn KeyValueStore> = match &config.database_path {
            Some(path) => {
                info!("opening persistent store at {}", path.display());
                Arc::new(DuckDbStore::open(path)?)
            }
            None => {
                info!("using in-memory persistent store");
                Arc::new(MemoryStore::with_quota(config.quota_bytes))
            }
        };

        let store = Arc::new(SecureStore::new(backend, provider, secret));
        let migrated = store
            .migrate_legacy(&[StorageKey::SyncLease.as_str()])
            .await?;
        if migrated > 0 {
            info!("encrypted {migrated} legacy values at startup");
        }

        let session = Arc::new(MemoryStore::unbounded());
        let artifacts = Arc::new(ArtifactCache::new());

        let mut scrub = ScrubProtocol::new(Arc::clone(&store), session.clone());
        scrub.register_secondary(artifacts.clone());
        match scrub.resume().await {
            Ok(ResumeOutcome::Idle) => {}
            Ok(outcome) => info!("settled interrupted scrub: {outcome:?}"),
            Err(e) => warn!("could not settle interrupted scrub: {e}"),
        }

        let queue = Arc::new(OfflineQueue::new(Arc::clone(&store), config.queue.clone())?);

        info!("data protection core started");
        Ok(Self {
            config,
            store,
            session,
            queue,
            scrub,
            artifacts,
            connectivity: ConnectivitySignal::new(false),
        })
    }

    /// Spawns the drain worker on the current runtime.
    pub fn spawn_queue_worker(&self, analyzer: Arc<dyn DocumentAnalyzer>) -> QueueWorkerHandle {
        let (handle, summaries, mut worker) =
            create_queue_worker(Arc::clone(&self.queue), analyzer, &self.connectivity);
        let task = tokio::spawn(async move { worker.run().await });
        QueueWorkerHandle {
            handle,
            summaries,
            task,
        }
    }

    pub fn config(&self) -> &LighthouseConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<SecureStore> {
        &self.store
    }

    /// Non-persistent state for the current session. Cleared by a scrub.
    pub fn session(&self) -> &Arc<MemoryStore> {
        &self.session
    }

    pub fn queue(&self) -> &Arc<OfflineQueue> {
        &self.queue
    }

    pub fn scrub(&self) -> &ScrubProtocol {
        &self.scrub
    }

    pub fn artifacts(&self) -> &Arc<ArtifactCache> {
        &self.artifacts
    }

    pub fn connectivity(&self) -> &ConnectivitySignal {
        &self.connectivity
    }
}
