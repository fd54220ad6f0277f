//! The persisted scrub phase marker.

use chrono::{DateTime, Utc};
use lighthouse_types::MemorialRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrubPhase {
    /// Phase 1 started; nothing has been destroyed yet.
    MemorialPending,
    /// The memorial is durable; erasure may proceed.
    MemorialCommitted,
    /// Erasure completed.
    Erased,
}

impl ScrubPhase {
    pub const fn as_str(self) -> &'static str {
        match self {
            ScrubPhase::MemorialPending => "memorial_pending",
            ScrubPhase::MemorialCommitted => "memorial_committed",
            ScrubPhase::Erased => "erased",
        }
    }
}

impl fmt::Display for ScrubPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contents of the `memorial` key: the phase plus, once committed, the memorial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrubState {
    pub phase: ScrubPhase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memorial: Option<MemorialRecord>,
    pub updated_at: DateTime<Utc>,
}

impl ScrubState {
    pub fn pending(now: DateTime<Utc>) -> Self {
        Self {
            phase: ScrubPhase::MemorialPending,
            memorial: None,
            updated_at: now,
        }
    }

    pub fn committed(memorial: MemorialRecord, now: DateTime<Utc>) -> Self {
        Self {
            phase: ScrubPhase::MemorialCommitted,
            memorial: Some(memorial),
            updated_at: now,
        }
    }

    pub fn erased(self, now: DateTime<Utc>) -> Self {
        Self {
            phase: ScrubPhase::Erased,
            updated_at: now,
            ..self
        }
    }

    /// The memorial is durable and erasure has not finished.
    pub fn is_committed(&self) -> bool {
        self.phase == ScrubPhase::MemorialCommitted
    }
}
