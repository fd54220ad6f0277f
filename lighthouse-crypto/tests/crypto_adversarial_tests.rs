//! Adversarial tests for envelope decryption.
//!
//! Tampering with any part of a stored envelope must surface as
//! `DecryptionFailed`, never as corrupted-but-parseable plaintext.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use lighthouse_crypto::{CryptoError, EncryptedEnvelope, KdfParams};

fn params() -> KdfParams {
    KdfParams {
        memory_kib: 64,
        iterations: 1,
        parallelism: 1,
    }
}

const SECRET: &str = "adversarial-secret";

fn sealed(plaintext: &[u8]) -> EncryptedEnvelope {
    EncryptedEnvelope::seal(plaintext, SECRET, &params()).unwrap()
}

fn with_ciphertext(envelope: &EncryptedEnvelope, bytes: &[u8]) -> EncryptedEnvelope {
    EncryptedEnvelope {
        ciphertext: BASE64.encode(bytes),
        ..envelope.clone()
    }
}

fn assert_decryption_failed(envelope: &EncryptedEnvelope) {
    match envelope.open(SECRET, &params()) {
        Err(CryptoError::DecryptionFailed(_)) => {}
        other => panic!("expected DecryptionFailed, got {other:?}"),
    }
}

// ── Ciphertext Tampering ──

#[test]
fn every_bit_flip_in_ciphertext_detected() {
    let envelope = sealed(br#"{"userName":"Jordan Vance"}"#);
    let ciphertext = BASE64.decode(&envelope.ciphertext).unwrap();

    for byte in 0..ciphertext.len() {
        for bit in 0..8 {
            let mut tampered = ciphertext.clone();
            tampered[byte] ^= 1 << bit;
            assert_decryption_failed(&with_ciphertext(&envelope, &tampered));
        }
    }
}

#[test]
fn truncated_ciphertext_detected() {
    let envelope = sealed(b"truncate me");
    let ciphertext = BASE64.decode(&envelope.ciphertext).unwrap();

    for len in [0, 1, ciphertext.len() / 2, ciphertext.len() - 1] {
        assert_decryption_failed(&with_ciphertext(&envelope, &ciphertext[..len]));
    }
}

#[test]
fn appended_bytes_detected() {
    let envelope = sealed(b"original");
    let mut ciphertext = BASE64.decode(&envelope.ciphertext).unwrap();
    ciphertext.push(0);
    assert_decryption_failed(&with_ciphertext(&envelope, &ciphertext));
}

// ── IV and Salt Tampering ──

#[test]
fn tampered_iv_detected() {
    let envelope = sealed(b"nonce-critical data");
    let mut iv = BASE64.decode(&envelope.iv).unwrap();
    iv[0] ^= 0xFF;
    assert_decryption_failed(&EncryptedEnvelope {
        iv: BASE64.encode(iv),
        ..envelope
    });
}

#[test]
fn tampered_salt_detected() {
    let envelope = sealed(b"salt-critical data");
    let mut salt = BASE64.decode(&envelope.salt).unwrap();
    salt[15] ^= 0x01;
    assert_decryption_failed(&EncryptedEnvelope {
        salt: BASE64.encode(salt),
        ..envelope
    });
}

#[test]
fn swapped_envelope_parts_detected() {
    let a = sealed(b"first");
    let b = sealed(b"second");
    assert_decryption_failed(&EncryptedEnvelope {
        ciphertext: a.ciphertext.clone(),
        iv: b.iv.clone(),
        salt: a.salt.clone(),
    });
    assert_decryption_failed(&EncryptedEnvelope {
        ciphertext: a.ciphertext,
        iv: a.iv,
        salt: b.salt,
    });
}

// ── Malformed Encoding ──

#[test]
fn non_base64_fields_detected() {
    let envelope = sealed(b"data");
    assert_decryption_failed(&EncryptedEnvelope {
        ciphertext: "not base64!!".into(),
        ..envelope.clone()
    });
    assert_decryption_failed(&EncryptedEnvelope {
        iv: "???".into(),
        ..envelope.clone()
    });
    assert_decryption_failed(&EncryptedEnvelope {
        salt: String::new(),
        ..envelope
    });
}

#[test]
fn wrong_kdf_params_detected() {
    let envelope = sealed(b"cost-bound data");
    let other = KdfParams {
        memory_kib: 128,
        ..params()
    };
    assert!(matches!(
        envelope.open(SECRET, &other),
        Err(CryptoError::DecryptionFailed(_))
    ));
}
