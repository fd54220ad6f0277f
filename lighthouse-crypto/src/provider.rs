//! Async encryption provider used by the storage and queue layers.

use crate::envelope::EncryptedEnvelope;
use crate::error::{CryptoError, CryptoResult};
use crate::key::{derive_key, fill_random, KdfParams, Salt, SALT_SIZE};
use crate::secret::AppSecret;
use crate::{open, seal};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

const SELF_TEST_PLAINTEXT: &[u8] = b"lighthouse-provider-self-test";

/// Seals and opens envelopes off the async executor.
///
/// Construct once at startup with [`EncryptionProvider::new`]; that is where
/// an unusable platform provider is detected.
#[derive(Clone, Debug)]
pub struct EncryptionProvider {
    params: KdfParams,
}

impl EncryptionProvider {
    /// Validates `params` and runs a derive/seal/open self-test.
    pub fn new(params: KdfParams) -> CryptoResult<Self> {
        params.validate()?;
        self_test(&params)?;

        if params.is_below_recommended() {
            warn!(
                memory_kib = params.memory_kib,
                iterations = params.iterations,
                "encryption provider running below recommended KDF cost"
            );
        }
        info!("encryption provider ready (argon2id + chacha20-poly1305)");
        Ok(Self { params })
    }

    /// Builds a provider without validation or the self-test, so invalid
    /// `params` make every operation fail as a provider broken after
    /// startup would.
    #[cfg(any(test, feature = "test-util"))]
    pub fn unchecked(params: KdfParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &KdfParams {
        &self.params
    }

    pub async fn encrypt_bytes(
        &self,
        plaintext: &[u8],
        secret: &AppSecret,
    ) -> CryptoResult<EncryptedEnvelope> {
        self.encrypt_owned(Zeroizing::new(plaintext.to_vec()), secret)
            .await
    }

    /// Serializes `value` to canonical JSON bytes, then encrypts them.
    pub async fn encrypt_json<T: Serialize + ?Sized>(
        &self,
        value: &T,
        secret: &AppSecret,
    ) -> CryptoResult<EncryptedEnvelope> {
        let bytes = serde_json::to_vec(value)
            .map_err(|e| CryptoError::EncryptionFailed(format!("serialization failed: {e}")))?;
        self.encrypt_owned(Zeroizing::new(bytes), secret).await
    }

    pub async fn decrypt_bytes(
        &self,
        envelope: &EncryptedEnvelope,
        secret: &AppSecret,
    ) -> CryptoResult<Vec<u8>> {
        let params = self.params;
        let envelope = envelope.clone();
        let secret = secret.clone();
        tokio::task::spawn_blocking(move || envelope.open(secret.expose(), &params))
            .await
            .map_err(|e| CryptoError::DecryptionFailed(format!("crypto task failed: {e}")))?
    }

    /// Decrypts and parses JSON. A parse failure is a decryption failure:
    /// authenticated bytes that are not the expected shape are not trusted.
    pub async fn decrypt_json<T: DeserializeOwned>(
        &self,
        envelope: &EncryptedEnvelope,
        secret: &AppSecret,
    ) -> CryptoResult<T> {
        let bytes = Zeroizing::new(self.decrypt_bytes(envelope, secret).await?);
        serde_json::from_slice(&bytes).map_err(|e| {
            CryptoError::DecryptionFailed(format!("decrypted payload is not valid JSON: {e}"))
        })
    }

    async fn encrypt_owned(
        &self,
        plaintext: Zeroizing<Vec<u8>>,
        secret: &AppSecret,
    ) -> CryptoResult<EncryptedEnvelope> {
        let params = self.params;
        let secret = secret.clone();
        let envelope = tokio::task::spawn_blocking(move || {
            EncryptedEnvelope::seal(&plaintext, secret.expose(), &params)
        })
        .await
        .map_err(|e| CryptoError::EncryptionFailed(format!("crypto task failed: {e}")))??;

        debug!(ciphertext_len = envelope.ciphertext.len(), "sealed envelope");
        Ok(envelope)
    }
}

fn self_test(params: &KdfParams) -> CryptoResult<()> {
    let mut salt = [0u8; SALT_SIZE];
    fill_random(&mut salt).map_err(CryptoError::KeyDerivation)?;

    let key = derive_key("lighthouse-self-test", &Salt::from_bytes(salt), params)?;
    let sealed = seal(&key, SELF_TEST_PLAINTEXT)
        .map_err(|e| CryptoError::KeyDerivation(format!("cipher self-test failed: {e}")))?;
    let opened = open(&key, &sealed.nonce, &sealed.ciphertext)
        .map_err(|e| CryptoError::KeyDerivation(format!("cipher self-test failed: {e}")))?;

    if opened != SELF_TEST_PLAINTEXT {
        return Err(CryptoError::KeyDerivation(
            "cipher self-test returned wrong plaintext".into(),
        ));
    }
    Ok(())
}
