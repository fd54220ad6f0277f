//! Two-phase scrub: commit the memorial, then erase everything else.
//!
//! There is no multi-key transaction, so the phase marker under the
//! `memorial` key is the commit record. Phase 2 only runs once that key
//! reports `MemorialCommitted`, and a crash at any point leaves a state
//! that [`ScrubProtocol::resume`] can settle.

use crate::erasable::Erasable;
use crate::error::{ScrubError, ScrubResult};
use crate::state::{ScrubPhase, ScrubState};
use chrono::Utc;
use lighthouse_storage::{KeyValueStore, SecureStore, StorageError};
use lighthouse_types::{MemorialRecord, StorageKey, UserRecord};
use std::sync::Arc;
use tracing::{debug, info, warn};

const MEMORIAL_KEY: StorageKey = StorageKey::Memorial;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemorialOutcome {
    /// The memorial is durable and erasure may proceed.
    Committed(MemorialRecord),
    /// The record holds no PII; no memorial was written.
    NothingToDo,
}

/// What a [`ScrubProtocol::hard_delete`] removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErasureReport {
    /// Persistent keys that held a value and were removed.
    pub erased_keys: Vec<String>,
    pub session_keys_cleared: usize,
    /// Secondary stores that could not be cleared, with the reason.
    pub secondary_failures: Vec<String>,
    /// Whether the backend flushed deleted data from its write-ahead state.
    pub checkpointed: bool,
    /// An earlier erasure had already completed. The sweep ran again and
    /// `erased_keys` lists anything written since.
    pub already_erased: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeOutcome {
    Idle,
    /// Phase 1 was interrupted. The marker was dropped; user data is intact.
    RolledBack,
    /// Phase 1 had committed; erasure ran to completion.
    Completed(ErasureReport),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrubOutcome {
    NothingToDo,
    Completed {
        memorial: MemorialRecord,
        report: ErasureReport,
    },
}

pub struct ScrubProtocol {
    store: Arc<SecureStore>,
    session: Arc<dyn KeyValueStore>,
    secondary: Vec<Arc<dyn Erasable>>,
}

impl ScrubProtocol {
    pub fn new(store: Arc<SecureStore>, session: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            session,
            secondary: Vec::new(),
        }
    }

    /// Registers a store to clear, best effort, after the primary erasure.
    pub fn register_secondary(&mut self, store: Arc<dyn Erasable>) {
        self.secondary.push(store);
    }

    pub fn contains_pii(record: &UserRecord) -> bool {
        record.contains_pii()
    }

    /// Phase 1. Persists the memorial under the excluded key and returns only
    /// once it is durable.
    ///
    /// Calling this again while the memorial is committed returns it
    /// unchanged. Once an erasure has finished, a record that holds PII
    /// starts a new scrub and replaces the memorial.
    pub async fn commit_memorial(
        &self,
        record: &UserRecord,
        derived_artifact_link: Option<&str>,
    ) -> ScrubResult<MemorialOutcome> {
        if let Some(state) = self.load_state().await? {
            if let (true, Some(memorial)) = (state.is_committed(), state.memorial) {
                debug!("memorial already committed");
                return Ok(MemorialOutcome::Committed(memorial));
            }
        }

        if !Self::contains_pii(record) {
            info!("record holds no PII, nothing to scrub");
            return Ok(MemorialOutcome::NothingToDo);
        }

        self.save_state(&ScrubState::pending(Utc::now())).await?;

        let now = Utc::now();
        let memorial = MemorialRecord::from_user_record(record, derived_artifact_link, now);
        self.save_state(&ScrubState::committed(memorial.clone(), now))
            .await?;

        match self.load_state().await? {
            Some(state) if state.phase == ScrubPhase::MemorialCommitted => {
                info!("memorial committed");
                Ok(MemorialOutcome::Committed(memorial))
            }
            other => Err(ScrubError::OutOfOrder {
                operation: "commit_memorial",
                phase: other.map(|s| s.phase),
            }),
        }
    }

    /// Phase 2. Erases every persisted key except `memorial`, then the
    /// session store, then registered secondary stores.
    ///
    /// After a finished erasure the sweep still runs, so data written since
    /// is removed too. The phase marker is left as it was.
    ///
    /// The persistent and session stores are authoritative: anything left in
    /// them fails the erasure with [`ScrubError::Incomplete`] and the phase
    /// stays `MemorialCommitted`. Secondary stores are best effort and only
    /// reported.
    pub async fn hard_delete(&self) -> ScrubResult<ErasureReport> {
        let state = match self.load_state().await? {
            Some(state)
                if matches!(
                    state.phase,
                    ScrubPhase::MemorialCommitted | ScrubPhase::Erased
                ) =>
            {
                state
            }
            other => {
                return Err(ScrubError::OutOfOrder {
                    operation: "hard_delete",
                    phase: other.map(|s| s.phase),
                })
            }
        };

        let mut report = ErasureReport {
            already_erased: state.phase == ScrubPhase::Erased,
            ..ErasureReport::default()
        };

        for key in StorageKey::SENSITIVE {
            self.erase_key(key.as_str(), &mut report);
        }
        for key in self.store.keys()? {
            if StorageKey::is_erasable(&key) {
                self.erase_key(&key, &mut report);
            }
        }

        match self.session.keys() {
            Ok(keys) => {
                report.session_keys_cleared = keys.len();
                if let Err(e) = self.session.clear() {
                    warn!("session store not cleared: {e}");
                }
            }
            Err(e) => warn!("session store not enumerable: {e}"),
        }

        let mut remaining: Vec<String> = self
            .store
            .keys()?
            .into_iter()
            .filter(|key| StorageKey::is_erasable(key))
            .collect();
        remaining.extend(
            self.session
                .keys()?
                .into_iter()
                .map(|key| format!("session:{key}")),
        );
        if !remaining.is_empty() {
            warn!("erasure incomplete, {} keys remain", remaining.len());
            return Err(ScrubError::Incomplete { keys: remaining });
        }

        report.checkpointed = match self.store.backend().checkpoint() {
            Ok(()) => true,
            Err(e) => {
                warn!("checkpoint after erasure failed: {e}");
                false
            }
        };

        for secondary in &self.secondary {
            if let Err(e) = secondary.erase_all() {
                warn!("secondary store {} not erased: {e:#}", secondary.name());
                report
                    .secondary_failures
                    .push(format!("{}: {e}", secondary.name()));
            }
        }

        if !report.already_erased {
            self.save_state(&state.erased(Utc::now())).await?;
        }
        info!(
            "erasure complete: {} keys, {} session keys, {} secondary failures",
            report.erased_keys.len(),
            report.session_keys_cleared,
            report.secondary_failures.len()
        );
        Ok(report)
    }

    pub async fn get_memorial(&self) -> ScrubResult<Option<MemorialRecord>> {
        Ok(self.load_state().await?.and_then(|state| state.memorial))
    }

    pub async fn phase(&self) -> ScrubResult<Option<ScrubPhase>> {
        Ok(self.load_state().await?.map(|state| state.phase))
    }

    /// Removes the memorial at the user's request. Refused while an erasure
    /// is committed but unfinished, since the marker is what resumes it.
    ///
    /// An unreadable marker is discarded without being decoded.
    pub async fn clear_memorial(&self) -> ScrubResult<()> {
        let phase = match self.phase().await {
            Ok(phase) => phase,
            Err(ScrubError::MemorialUnreadable { reason }) => {
                warn!("discarding unreadable scrub marker: {reason}");
                self.store.discard(MEMORIAL_KEY.as_str())?;
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        if phase == Some(ScrubPhase::MemorialCommitted) {
            return Err(ScrubError::OutOfOrder {
                operation: "clear_memorial",
                phase,
            });
        }
        self.store.remove(MEMORIAL_KEY.as_str())?;
        info!("memorial cleared by user");
        Ok(())
    }

    /// Settles a scrub interrupted by a crash. Run once at launch.
    pub async fn resume(&self) -> ScrubResult<ResumeOutcome> {
        match self.phase().await? {
            Some(ScrubPhase::MemorialPending) => {
                warn!("scrub interrupted before memorial commit, rolling back marker");
                self.store.remove(MEMORIAL_KEY.as_str())?;
                Ok(ResumeOutcome::RolledBack)
            }
            Some(ScrubPhase::MemorialCommitted) => {
                warn!("scrub interrupted after memorial commit, resuming erasure");
                Ok(ResumeOutcome::Completed(self.hard_delete().await?))
            }
            Some(ScrubPhase::Erased) | None => Ok(ResumeOutcome::Idle),
        }
    }

    /// Runs both phases back to back.
    #[deprecated(note = "call commit_memorial, confirm the memorial, then hard_delete")]
    pub async fn scrub(
        &self,
        record: &UserRecord,
        derived_artifact_link: Option<&str>,
    ) -> ScrubResult<ScrubOutcome> {
        match self.commit_memorial(record, derived_artifact_link).await? {
            MemorialOutcome::NothingToDo => Ok(ScrubOutcome::NothingToDo),
            MemorialOutcome::Committed(memorial) => {
                let report = self.hard_delete().await?;
                Ok(ScrubOutcome::Completed { memorial, report })
            }
        }
    }

    fn erase_key(&self, key: &str, report: &mut ErasureReport) {
        let existed = match self.store.contains(key) {
            Ok(existed) => existed,
            Err(e) => {
                warn!("could not inspect {key} before erasure: {e}");
                true
            }
        };
        match self.store.remove(key) {
            Ok(()) if existed => report.erased_keys.push(key.to_string()),
            Ok(()) => {}
            Err(e) => warn!("failed to erase {key}: {e}"),
        }
    }

    async fn load_state(&self) -> ScrubResult<Option<ScrubState>> {
        match self.store.load_strict(MEMORIAL_KEY.as_str()).await {
            Ok(state) => Ok(state),
            Err(StorageError::Unrecoverable { reason, .. }) => {
                Err(ScrubError::MemorialUnreadable { reason })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn save_state(&self, state: &ScrubState) -> ScrubResult<()> {
        self.store.save(MEMORIAL_KEY.as_str(), state).await?;
        debug!("scrub phase now {}", state.phase);
        Ok(())
    }
}
