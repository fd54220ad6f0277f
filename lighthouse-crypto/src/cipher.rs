//! ChaCha20-Poly1305 authenticated encryption.

use crate::error::{CryptoError, CryptoResult};
use crate::key::{fill_random, DerivedKey};
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};

/// Nonce size in bytes (96 bits).
pub const NONCE_SIZE: usize = 12;

/// Poly1305 tag size in bytes, appended to every ciphertext.
pub const TAG_SIZE: usize = 16;

/// Output of [`seal`]: the nonce it drew and the ciphertext with tag.
#[derive(Clone, Debug)]
pub struct Sealed {
    pub nonce: [u8; NONCE_SIZE],
    pub ciphertext: Vec<u8>,
}

/// Encrypts `plaintext` under a fresh random nonce.
pub fn seal(key: &DerivedKey, plaintext: &[u8]) -> CryptoResult<Sealed> {
    let mut nonce = [0u8; NONCE_SIZE];
    fill_random(&mut nonce).map_err(CryptoError::EncryptionFailed)?;

    let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|e| CryptoError::EncryptionFailed(format!("cipher error: {e}")))?;

    Ok(Sealed { nonce, ciphertext })
}

/// Decrypts and authenticates. Any tag mismatch is an error.
pub fn open(key: &DerivedKey, nonce: &[u8; NONCE_SIZE], ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
    if ciphertext.len() < TAG_SIZE {
        return Err(CryptoError::DecryptionFailed(format!(
            "ciphertext shorter than tag ({} bytes)",
            ciphertext.len()
        )));
    }

    let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| {
            CryptoError::DecryptionFailed("authentication failed (wrong secret or tampered data)".into())
        })
}
