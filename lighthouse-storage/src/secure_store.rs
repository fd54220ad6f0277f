//! Transparent encryption over a raw key/value backend.
//!
//! Writes are last-writer-wins. The store takes no locks of its own;
//! callers that need cross-key atomicity coordinate themselves.

use crate::error::{StorageError, StorageResult};
use crate::kv::KeyValueStore;
use crate::stored_value::{StoredValue, ValueOrigin};
use lighthouse_crypto::{AppSecret, CryptoResult, EncryptedEnvelope, EncryptionProvider};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How a `save` landed in the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Encrypted,
    /// Encryption failed and the value was written unencrypted.
    PlaintextFallback,
}

pub struct SecureStore {
    backend: Arc<dyn KeyValueStore>,
    provider: EncryptionProvider,
    secret: AppSecret,
}

impl SecureStore {
    pub fn new(
        backend: Arc<dyn KeyValueStore>,
        provider: EncryptionProvider,
        secret: AppSecret,
    ) -> Self {
        Self {
            backend,
            provider,
            secret,
        }
    }

    /// The raw backend. Anything read from it directly is ciphertext.
    pub fn backend(&self) -> &Arc<dyn KeyValueStore> {
        &self.backend
    }

    /// Encrypts `value` and writes it under `key`.
    ///
    /// If the cipher fails the value is written as tagged plaintext with a
    /// warning rather than dropped; it is re-encrypted on its next read.
    pub async fn save<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> StorageResult<SaveOutcome> {
        let data = serde_json::to_value(value)?;

        let (stored, outcome) = match self.provider.encrypt_json(&data, &self.secret).await {
            Ok(envelope) => (StoredValue::Encrypted { envelope }, SaveOutcome::Encrypted),
            Err(e) => {
                warn!(key, error = %e, "encryption failed, writing value UNENCRYPTED");
                (StoredValue::Plaintext { data }, SaveOutcome::PlaintextFallback)
            }
        };

        self.backend.set(key, &stored.to_raw()?)?;
        debug!(key, ?outcome, "saved value");
        Ok(outcome)
    }

    /// Background read. An unrecoverable value is logged and reported as
    /// absent so callers fall back to their default.
    pub async fn load<T: DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        match self.read(key).await {
            Err(StorageError::Unrecoverable { key, reason }) => {
                warn!(key = %key, reason = %reason, "unrecoverable value, substituting default");
                Ok(None)
            }
            other => other,
        }
    }

    /// User-initiated read. An unrecoverable value is returned as
    /// [`StorageError::Unrecoverable`] so the user can choose to
    /// [`discard`](Self::discard) it.
    pub async fn load_strict<T: DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        self.read(key).await
    }

    pub async fn load_or_default<T: DeserializeOwned + Default>(
        &self,
        key: &str,
    ) -> StorageResult<T> {
        Ok(self.load(key).await?.unwrap_or_default())
    }

    pub fn remove(&self, key: &str) -> StorageResult<()> {
        self.backend.remove(key)
    }

    /// Drops a value the user confirmed is unrecoverable.
    pub fn discard(&self, key: &str) -> StorageResult<()> {
        self.backend.remove(key)?;
        info!(key, "discarded unrecoverable value");
        Ok(())
    }

    pub fn contains(&self, key: &str) -> StorageResult<bool> {
        self.backend.contains(key)
    }

    pub fn keys(&self) -> StorageResult<Vec<String>> {
        self.backend.keys()
    }

    /// Seals raw bytes under the store's secret without persisting them.
    pub async fn seal_bytes(&self, bytes: &[u8]) -> CryptoResult<EncryptedEnvelope> {
        self.provider.encrypt_bytes(bytes, &self.secret).await
    }

    /// Opens an envelope produced by [`seal_bytes`](Self::seal_bytes).
    pub async fn open_bytes(&self, envelope: &EncryptedEnvelope) -> CryptoResult<Vec<u8>> {
        self.provider.decrypt_bytes(envelope, &self.secret).await
    }

    /// Rewrites every legacy plaintext value as an encrypted envelope.
    /// Keys in `exempt` are left untouched. Returns how many were migrated.
    pub async fn migrate_legacy(&self, exempt: &[&str]) -> StorageResult<usize> {
        let mut migrated = 0;
        for key in self.backend.keys()? {
            if exempt.contains(&key.as_str()) {
                continue;
            }
            let Some(raw) = self.backend.get(&key)? else {
                continue;
            };
            match StoredValue::parse(&raw) {
                (StoredValue::Plaintext { data }, _) => {
                    if self.migrate(&key, &raw, &data).await {
                        migrated += 1;
                    }
                }
                (encrypted, ValueOrigin::LegacyEnvelope) => {
                    self.rewrite_if_unchanged(&key, &raw, &encrypted)?;
                }
                _ => {}
            }
        }
        if migrated > 0 {
            info!(migrated, "migrated legacy plaintext values");
        }
        Ok(migrated)
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        let Some(raw) = self.backend.get(key)? else {
            return Ok(None);
        };

        match StoredValue::parse(&raw) {
            (StoredValue::Encrypted { envelope }, origin) => {
                let data: Value = self
                    .provider
                    .decrypt_json(&envelope, &self.secret)
                    .await
                    .map_err(|e| StorageError::Unrecoverable {
                        key: key.to_string(),
                        reason: e.to_string(),
                    })?;
                let value = decode(key, data)?;
                if origin == ValueOrigin::LegacyEnvelope {
                    self.rewrite_if_unchanged(key, &raw, &StoredValue::Encrypted { envelope })?;
                }
                Ok(Some(value))
            }
            (StoredValue::Plaintext { data }, _) => {
                let value = decode(key, data.clone())?;
                self.migrate(key, &raw, &data).await;
                Ok(Some(value))
            }
        }
    }

    /// Re-encrypts a plaintext value in place. Failure leaves it as is.
    async fn migrate(&self, key: &str, original_raw: &str, data: &Value) -> bool {
        let envelope = match self.provider.encrypt_json(data, &self.secret).await {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(key, error = %e, "could not migrate plaintext value, keeping it");
                return false;
            }
        };

        match self.rewrite_if_unchanged(key, original_raw, &StoredValue::Encrypted { envelope }) {
            Ok(true) => {
                debug!(key, "migrated plaintext value to encrypted envelope");
                true
            }
            Ok(false) => false,
            Err(e) => {
                warn!(key, error = %e, "could not migrate plaintext value, keeping it");
                false
            }
        }
    }

    /// Writes `replacement` only if the key still holds `original_raw`, so a
    /// migration never clobbers a save that landed while it was encrypting.
    fn rewrite_if_unchanged(
        &self,
        key: &str,
        original_raw: &str,
        replacement: &StoredValue,
    ) -> StorageResult<bool> {
        if self.backend.get(key)?.as_deref() != Some(original_raw) {
            return Ok(false);
        }
        self.backend.set(key, &replacement.to_raw()?)?;
        Ok(true)
    }
}

fn decode<T: DeserializeOwned>(key: &str, data: Value) -> StorageResult<T> {
    serde_json::from_value(data).map_err(|e| StorageError::Unrecoverable {
        key: key.to_string(),
        reason: format!("stored value has unexpected shape: {e}"),
    })
}
