//! Encryption-at-rest for Lighthouse.
//!
//! Every value written to device storage is sealed into an
//! [`EncryptedEnvelope`] using:
//! - Argon2id to derive a 256-bit key from the application secret and a
//!   fresh per-envelope salt
//! - ChaCha20-Poly1305 for authenticated encryption under a fresh nonce
//!
//! # Key handling
//!
//! Derived keys are never cached. Each encrypt and decrypt re-derives from
//! the secret and the envelope's own salt, and the key is zeroized as soon
//! as the operation finishes. Only the secret itself, wrapped in
//! [`AppSecret`], lives beyond a single call.
//!
//! The KDF and cipher run on tokio's blocking pool, so
//! [`EncryptionProvider`] operations are the suspension points callers
//! should expect.

mod cipher;
pub mod envelope;
mod error;
mod key;
pub mod provider;
mod secret;

pub use cipher::{open, seal, Sealed, NONCE_SIZE, TAG_SIZE};
pub use envelope::{is_envelope, EncryptedEnvelope};
pub use error::{CryptoError, CryptoResult};
pub use key::{derive_key, DerivedKey, KdfParams, Salt, KEY_SIZE, SALT_SIZE};
pub use provider::EncryptionProvider;
pub use secret::AppSecret;
