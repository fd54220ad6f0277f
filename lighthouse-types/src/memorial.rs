//! The memorial record preserved by a scrub.

use crate::record::UserRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Message recorded when the user shared their story.
pub const HONORED_MESSAGE: &str = "Their story has been honored.";

/// Display name used when no counterpart name was recorded.
pub const FALLBACK_DISPLAY_NAME: &str = "Your loved one";

/// The single non-identifying record that survives a completed scrub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemorialRecord {
    pub counterpart_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memorial_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derived_artifact_link: Option<String>,
    /// Human-readable, e.g. "October 16, 2026".
    pub completion_date: String,
}

impl MemorialRecord {
    /// Derives the memorial from a live record. Pure; nothing is persisted.
    pub fn from_user_record(
        record: &UserRecord,
        derived_artifact_link: Option<&str>,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            counterpart_name: record
                .counterpart_display_name()
                .unwrap_or(FALLBACK_DISPLAY_NAME)
                .to_string(),
            memorial_message: record
                .has_narrative()
                .then(|| HONORED_MESSAGE.to_string()),
            derived_artifact_link: derived_artifact_link
                .map(str::trim)
                .filter(|link| !link.is_empty())
                .map(str::to_string),
            completion_date: format_completion_date(completed_at),
        }
    }
}

pub fn format_completion_date(at: DateTime<Utc>) -> String {
    at.format("%B %-d, %Y").to_string()
}
