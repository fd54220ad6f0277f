//! The self-describing ciphertext envelope persisted for every value.
//!
//! An envelope carries the three things needed to decrypt, each base64:
//! the ciphertext (with its Poly1305 tag), the nonce (`iv`), and the
//! Argon2id salt. Only the application secret is missing.

use crate::cipher::{open, seal, NONCE_SIZE, TAG_SIZE};
use crate::error::{CryptoError, CryptoResult};
use crate::key::{derive_key, KdfParams, Salt, SALT_SIZE};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// One encrypted value. Immutable once sealed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EncryptedEnvelope {
    pub ciphertext: String,
    pub iv: String,
    pub salt: String,
}

impl EncryptedEnvelope {
    /// Seals `plaintext` with a fresh salt and nonce. Blocking: runs the KDF.
    pub fn seal(plaintext: &[u8], secret: &str, params: &KdfParams) -> CryptoResult<Self> {
        let salt = Salt::random()?;
        let key = derive_key(secret, &salt, params)
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;
        let sealed = seal(&key, plaintext)?;

        Ok(Self {
            ciphertext: BASE64.encode(&sealed.ciphertext),
            iv: BASE64.encode(sealed.nonce),
            salt: BASE64.encode(salt.as_bytes()),
        })
    }

    /// Opens the envelope. Blocking: runs the KDF.
    pub fn open(&self, secret: &str, params: &KdfParams) -> CryptoResult<Vec<u8>> {
        let (salt, nonce, ciphertext) = self.decode()?;
        let key = derive_key(secret, &salt, params)
            .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))?;
        open(&key, &nonce, &ciphertext)
    }

    fn decode(&self) -> CryptoResult<(Salt, [u8; NONCE_SIZE], Vec<u8>)> {
        let salt: [u8; SALT_SIZE] = decode_fixed(&self.salt, "salt")?;
        let nonce: [u8; NONCE_SIZE] = decode_fixed(&self.iv, "iv")?;
        let ciphertext = BASE64
            .decode(&self.ciphertext)
            .map_err(|e| CryptoError::DecryptionFailed(format!("ciphertext is not base64: {e}")))?;
        Ok((Salt::from_bytes(salt), nonce, ciphertext))
    }
}

fn decode_fixed<const N: usize>(encoded: &str, field: &str) -> CryptoResult<[u8; N]> {
    let bytes = BASE64
        .decode(encoded)
        .map_err(|e| CryptoError::DecryptionFailed(format!("{field} is not base64: {e}")))?;
    bytes.try_into().map_err(|bytes: Vec<u8>| {
        CryptoError::DecryptionFailed(format!("{field} must be {N} bytes, got {}", bytes.len()))
    })
}

/// Whether a JSON value has the shape of an [`EncryptedEnvelope`]: exactly
/// the three fields, each valid base64 of a plausible length.
pub fn is_envelope(value: &serde_json::Value) -> bool {
    let Some(object) = value.as_object() else {
        return false;
    };
    if object.len() != 3 {
        return false;
    }

    let field_len = |name: &str| {
        object
            .get(name)
            .and_then(serde_json::Value::as_str)
            .and_then(|s| BASE64.decode(s).ok())
            .map(|bytes| bytes.len())
    };

    matches!(field_len("salt"), Some(SALT_SIZE))
        && matches!(field_len("iv"), Some(NONCE_SIZE))
        && field_len("ciphertext").is_some_and(|len| len >= TAG_SIZE)
}
