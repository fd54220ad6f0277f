//! Tagged representation of every persisted value.

use crate::error::StorageResult;
use lighthouse_crypto::{is_envelope, EncryptedEnvelope};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A value as written to the persistent store.
///
/// Every write produces one of these two tagged forms. Untagged data found
/// in the store predates tagging and is classified once by [`StoredValue::parse`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum StoredValue {
    /// Written only when encryption failed, or by releases before encryption.
    Plaintext { data: Value },
    Encrypted { envelope: EncryptedEnvelope },
}

/// Where a parsed value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueOrigin {
    Tagged,
    /// A bare envelope object written before tagging.
    LegacyEnvelope,
    /// Raw JSON or text written before encryption existed.
    LegacyPlaintext,
}

impl StoredValue {
    pub fn parse(raw: &str) -> (Self, ValueOrigin) {
        if let Ok(tagged) = serde_json::from_str::<StoredValue>(raw) {
            return (tagged, ValueOrigin::Tagged);
        }

        let Ok(data) = serde_json::from_str::<Value>(raw) else {
            return (
                StoredValue::Plaintext {
                    data: Value::String(raw.to_string()),
                },
                ValueOrigin::LegacyPlaintext,
            );
        };

        if is_envelope(&data) {
            if let Ok(envelope) = serde_json::from_value::<EncryptedEnvelope>(data.clone()) {
                return (StoredValue::Encrypted { envelope }, ValueOrigin::LegacyEnvelope);
            }
        }
        (StoredValue::Plaintext { data }, ValueOrigin::LegacyPlaintext)
    }

    pub fn to_raw(&self) -> StorageResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn is_encrypted(&self) -> bool {
        matches!(self, StoredValue::Encrypted { .. })
    }
}
