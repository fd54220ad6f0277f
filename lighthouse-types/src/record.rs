//! The sensitive intake record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Serialized names of every identifier-like field of [`UserRecord`].
///
/// The counterpart's display name is deliberately absent: it is the one
/// field the memorial keeps.
pub const SENSITIVE_FIELDS: &[&str] = &[
    "userName",
    "dateOfPassing",
    "placeOfPassing",
    "residence",
    "identifiers",
    "scannedDocuments",
    "narrative",
];

/// A document captured during intake (will, policy, ID card).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannedDocument {
    pub file_name: String,
    pub mime_type: String,
    /// Structured fields extracted by the analysis service.
    #[serde(default)]
    pub extracted_fields: BTreeMap<String, String>,
    pub scanned_at: DateTime<Utc>,
}

/// Everything the intake flow learns about the user and the person they lost.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserRecord {
    pub user_name: Option<String>,
    pub counterpart_name: Option<String>,
    pub relationship: Option<String>,
    pub date_of_passing: Option<String>,
    pub place_of_passing: Option<String>,
    pub residence: Option<String>,
    /// Legal and financial identifiers keyed by label (policy number, case number).
    pub identifiers: BTreeMap<String, String>,
    pub scanned_documents: Vec<ScannedDocument>,
    /// Free-text story the user chose to record.
    pub narrative: Option<String>,
}

impl UserRecord {
    /// Whether any identifying field is set.
    ///
    /// A record holding nothing but the counterpart's name (and relationship)
    /// carries no PII worth scrubbing.
    pub fn contains_pii(&self) -> bool {
        is_set(&self.user_name)
            || is_set(&self.date_of_passing)
            || is_set(&self.place_of_passing)
            || is_set(&self.residence)
            || self.identifiers.values().any(|v| !v.trim().is_empty())
            || !self.scanned_documents.is_empty()
            || is_set(&self.narrative)
    }

    /// The counterpart's trimmed display name, if one was recorded.
    pub fn counterpart_display_name(&self) -> Option<&str> {
        self.counterpart_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    pub fn has_narrative(&self) -> bool {
        is_set(&self.narrative)
    }
}

fn is_set(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|v| !v.trim().is_empty())
}
