//! Adversarial and property tests for the AES-256-GCM blob cipher.
//!
//! Tests round-trip, salt/nonce freshness, wrong-key decryption, bit flips
//! in every blob region, truncation, and malformed encodings. These validate
//! the guarantees the settings and reconciliation layers rely on for stored
//! passwords and API tokens.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use proptest::prelude::*;
use stashbox_crypto::{
    CryptoBox, CryptoError, EncryptedBlob, MasterKey, IV_SIZE, SALT_SIZE, TAG_SIZE,
};

fn crypto_with_key(byte: u8) -> CryptoBox {
    let key = MasterKey::from_hex(&hex::encode([byte; 32])).unwrap();
    CryptoBox::new(key)
}

fn crypto() -> CryptoBox {
    crypto_with_key(0x42)
}

// ── Round-trip ──

#[test]
fn encrypt_decrypt_roundtrip() {
    let cb = crypto();
    let blob = cb.encrypt("provider-api-token-value").unwrap();
    assert_eq!(cb.decrypt(&blob).unwrap(), "provider-api-token-value");
}

#[test]
fn roundtrip_empty_string() {
    let cb = crypto();
    let blob = cb.encrypt("").unwrap();
    assert_eq!(cb.decrypt(&blob).unwrap(), "");
}

#[test]
fn roundtrip_unicode() {
    let cb = crypto();
    let blob = cb.encrypt("pāsswörd-✓-密码").unwrap();
    assert_eq!(cb.decrypt(&blob).unwrap(), "pāsswörd-✓-密码");
}

// ── Freshness ──

#[test]
fn same_plaintext_yields_different_blobs() {
    let cb = crypto();
    let a = cb.encrypt("identical secret").unwrap();
    let b = cb.encrypt("identical secret").unwrap();
    assert_ne!(a, b, "salt/iv must be fresh per call");
}

// ── Wrong key ──

#[test]
fn decrypt_with_wrong_key_returns_error() {
    let blob = crypto_with_key(0x01).encrypt("secret").unwrap();
    let err = crypto_with_key(0x02).decrypt(&blob).unwrap_err();

    match err {
        CryptoError::Decryption(msg) => {
            assert!(
                msg.contains("wrong key") || msg.contains("tampered"),
                "should indicate authentication failure, got: {msg}"
            );
        }
        other => panic!("expected CryptoError::Decryption, got: {other:?}"),
    }
}

// ── Tampering ──

fn flip_byte(blob: &EncryptedBlob, index: usize) -> EncryptedBlob {
    let mut raw = BASE64.decode(blob.as_str()).unwrap();
    raw[index] ^= 0x01;
    EncryptedBlob::from_encoded(BASE64.encode(raw))
}

#[test]
fn bit_flip_in_ciphertext_detected() {
    let cb = crypto();
    let blob = cb.encrypt("integrity-protected data").unwrap();
    let header = SALT_SIZE + IV_SIZE + TAG_SIZE;

    let tampered = flip_byte(&blob, header); // first ciphertext byte
    assert!(matches!(
        cb.decrypt(&tampered),
        Err(CryptoError::Decryption(_))
    ));
}

#[test]
fn bit_flip_in_tag_detected() {
    let cb = crypto();
    let blob = cb.encrypt("integrity-protected data").unwrap();

    let tampered = flip_byte(&blob, SALT_SIZE + IV_SIZE); // first tag byte
    assert!(matches!(
        cb.decrypt(&tampered),
        Err(CryptoError::Decryption(_))
    ));
}

#[test]
fn bit_flip_in_salt_detected() {
    // A flipped salt derives a different key, which fails the tag check.
    let cb = crypto();
    let blob = cb.encrypt("integrity-protected data").unwrap();

    let tampered = flip_byte(&blob, 0);
    assert!(cb.decrypt(&tampered).is_err());
}

#[test]
fn bit_flip_in_iv_detected() {
    let cb = crypto();
    let blob = cb.encrypt("integrity-protected data").unwrap();

    let tampered = flip_byte(&blob, SALT_SIZE);
    assert!(cb.decrypt(&tampered).is_err());
}

// ── Malformed blobs ──

#[test]
fn not_base64_is_rejected() {
    let cb = crypto();
    let err = cb
        .decrypt(&EncryptedBlob::from_encoded("not//valid@@base64!!"))
        .unwrap_err();
    assert!(matches!(err, CryptoError::Decryption(_)));
}

#[test]
fn truncated_blob_is_rejected() {
    let cb = crypto();
    let short = BASE64.encode([0u8; SALT_SIZE + IV_SIZE]); // shorter than header
    let err = cb
        .decrypt(&EncryptedBlob::from_encoded(short))
        .unwrap_err();
    match err {
        CryptoError::Decryption(msg) => assert!(msg.contains("too short")),
        other => panic!("expected CryptoError::Decryption, got: {other:?}"),
    }
}

#[test]
fn empty_blob_is_rejected() {
    let cb = crypto();
    assert!(cb.decrypt(&EncryptedBlob::from_encoded("")).is_err());
}

// ── Master key validation ──

#[test]
fn key_must_be_valid_hex() {
    let err = MasterKey::from_hex("zz".repeat(32).as_str()).unwrap_err();
    assert!(matches!(err, CryptoError::Configuration(_)));
}

#[test]
fn key_must_be_32_bytes() {
    let err = MasterKey::from_hex(&hex::encode([0u8; 16])).unwrap_err();
    match err {
        CryptoError::Configuration(msg) => assert!(msg.contains("32 bytes")),
        other => panic!("expected CryptoError::Configuration, got: {other:?}"),
    }
}

#[test]
fn key_hex_is_whitespace_tolerant() {
    let encoded = format!("  {}\n", hex::encode([7u8; 32]));
    assert!(MasterKey::from_hex(&encoded).is_ok());
}

// ── Properties ──

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn roundtrip_arbitrary_plaintext(plaintext in ".{0,128}") {
        let cb = crypto();
        let blob = cb.encrypt(&plaintext).unwrap();
        prop_assert_eq!(cb.decrypt(&blob).unwrap(), plaintext);
    }
}
