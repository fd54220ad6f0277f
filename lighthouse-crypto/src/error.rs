//! Crypto error types.

use thiserror::Error;

pub type CryptoResult<T> = Result<T, CryptoError>;

#[derive(Debug, Error)]
pub enum CryptoError {
    /// The platform cannot derive keys (bad parameters, no random source).
    /// Fatal at startup.
    #[error("key derivation unavailable: {0}")]
    KeyDerivation(String),

    /// Serialization or cipher failure while sealing. Recoverable.
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    /// Wrong secret, tampered envelope, or malformed encoding.
    /// The value is unrecoverable; never trust partial output.
    #[error("decryption failed: {0}")]
    DecryptionFailed(String),
}
