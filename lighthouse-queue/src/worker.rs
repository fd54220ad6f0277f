//! Drain worker driven by connectivity changes and explicit retries.
//!
//! Follows the handle/engine split of a sync orchestrator: the worker owns
//! the receivers and runs a `select!` loop, the cloneable handle sends it
//! commands. There is no polling interval.

use crate::analyzer::DocumentAnalyzer;
use crate::error::{QueueError, QueueResult};
use crate::offline_queue::{DrainSummary, OfflineQueue};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info};

/// Online/offline state published by the platform.
pub struct ConnectivitySignal {
    tx: watch::Sender<bool>,
}

impl ConnectivitySignal {
    pub fn new(online: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        Self { tx }
    }

    /// Publishes a state. Repeating the current state notifies nobody.
    pub fn set_online(&self, online: bool) {
        self.tx.send_if_modified(|current| {
            let changed = *current != online;
            *current = online;
            changed
        });
    }

    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueCommand {
    /// Drain now, whatever the connectivity state.
    Retry,
    Stop,
}

/// Handle for sending commands to a running [`QueueWorker`].
#[derive(Clone)]
pub struct QueueHandle {
    command_tx: mpsc::Sender<QueueCommand>,
}

impl QueueHandle {
    pub async fn retry(&self) -> QueueResult<()> {
        self.send(QueueCommand::Retry).await
    }

    pub async fn stop(&self) -> QueueResult<()> {
        self.send(QueueCommand::Stop).await
    }

    async fn send(&self, command: QueueCommand) -> QueueResult<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| QueueError::WorkerStopped)
    }
}

pub struct QueueWorker {
    queue: Arc<OfflineQueue>,
    analyzer: Arc<dyn DocumentAnalyzer>,
    connectivity: watch::Receiver<bool>,
    was_online: bool,
    command_rx: mpsc::Receiver<QueueCommand>,
    summary_tx: mpsc::Sender<DrainSummary>,
}

/// Creates a worker, its command handle, and a receiver of drain summaries.
///
/// The connectivity state is sampled here, so a transition published before
/// `run` is first polled still triggers a drain.
pub fn create_queue_worker(
    queue: Arc<OfflineQueue>,
    analyzer: Arc<dyn DocumentAnalyzer>,
    connectivity: &ConnectivitySignal,
) -> (QueueHandle, mpsc::Receiver<DrainSummary>, QueueWorker) {
    let (command_tx, command_rx) = mpsc::channel(16);
    let (summary_tx, summary_rx) = mpsc::channel(16);
    let rx = connectivity.subscribe();
    let was_online = *rx.borrow();

    let worker = QueueWorker {
        queue,
        analyzer,
        connectivity: rx,
        was_online,
        command_rx,
        summary_tx,
    };

    (QueueHandle { command_tx }, summary_rx, worker)
}

impl QueueWorker {
    /// Runs until stopped, the handle is dropped, or the signal goes away.
    pub async fn run(&mut self) {
        info!("offline queue worker started (online: {})", self.was_online);

        loop {
            tokio::select! {
                changed = self.connectivity.changed() => {
                    if changed.is_err() {
                        info!("connectivity signal dropped, stopping queue worker");
                        break;
                    }
                    let online = *self.connectivity.borrow_and_update();
                    let restored = online && !self.was_online;
                    self.was_online = online;
                    if restored {
                        self.drain("connectivity restored").await;
                    } else {
                        debug!("connectivity changed (online: {online})");
                    }
                }
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(QueueCommand::Retry) => self.drain("retry requested").await,
                        Some(QueueCommand::Stop) => {
                            info!("offline queue worker stopping");
                            break;
                        }
                        None => {
                            info!("command channel closed, stopping queue worker");
                            break;
                        }
                    }
                }
            }
        }

        info!("offline queue worker stopped");
    }

    async fn drain(&self, trigger: &str) {
        debug!("drain triggered: {trigger}");
        match self.queue.drain(self.analyzer.as_ref()).await {
            Ok(summary) => {
                if self.summary_tx.try_send(summary).is_err() {
                    debug!("no listener for drain summary");
                }
            }
            Err(e) => error!("drain failed ({trigger}): {e}"),
        }
    }
}
