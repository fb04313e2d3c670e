//! AES-256-GCM authenticated encryption with per-value key derivation.
//!
//! Blob layout (before base64): `salt(64) ‖ iv(12) ‖ tag(16) ‖ ciphertext`.
//! The encryption key is derived per call with PBKDF2-HMAC-SHA256 from the
//! master key and the embedded salt, so the master key itself never touches
//! the cipher directly and every blob is self-describing.

use crate::error::{CryptoError, CryptoResult};
use crate::key::MasterKey;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroize;

/// Random salt length for key derivation.
pub const SALT_SIZE: usize = 64;
/// GCM nonce length (96 bits).
pub const IV_SIZE: usize = 12;
/// GCM authentication tag length.
pub const TAG_SIZE: usize = 16;
/// PBKDF2-HMAC-SHA256 iteration count.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

const HEADER_SIZE: usize = SALT_SIZE + IV_SIZE + TAG_SIZE;

/// An opaque encrypted value, safe to persist.
///
/// Produced only by [`CryptoBox::encrypt`] and consumed only by
/// [`CryptoBox::decrypt`]. Immutable once created; any corruption fails the
/// authentication tag check on decrypt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptedBlob(String);

impl EncryptedBlob {
    /// Wraps an already-encoded blob (e.g. read back from the database).
    pub fn from_encoded(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EncryptedBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Authenticated symmetric encryption for values at rest.
pub struct CryptoBox {
    key: MasterKey,
}

impl CryptoBox {
    pub fn new(key: MasterKey) -> Self {
        Self { key }
    }

    /// Constructs a crypto box from the `ENCRYPTION_KEY` environment variable.
    pub fn from_env() -> CryptoResult<Self> {
        Ok(Self::new(MasterKey::from_env()?))
    }

    /// Encrypts a plaintext into a self-describing base64 blob.
    ///
    /// A fresh salt and nonce are drawn per call, so encrypting the same
    /// plaintext twice yields different blobs. This is a required property:
    /// equal stored values must not be linkable.
    pub fn encrypt(&self, plaintext: &str) -> CryptoResult<EncryptedBlob> {
        let mut salt = [0u8; SALT_SIZE];
        OsRng.fill_bytes(&mut salt);
        let mut iv = [0u8; IV_SIZE];
        OsRng.fill_bytes(&mut iv);

        let mut derived = self.derive_key(&salt);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&derived));
        let sealed = cipher
            .encrypt(Nonce::from_slice(&iv), plaintext.as_bytes())
            .map_err(|e| CryptoError::Encryption(e.to_string()))?;
        derived.zeroize();

        // aes-gcm appends the tag to the ciphertext; the blob layout keeps
        // the tag in the header instead.
        let (ciphertext, tag) = sealed.split_at(sealed.len() - TAG_SIZE);

        let mut combined = Vec::with_capacity(HEADER_SIZE + ciphertext.len());
        combined.extend_from_slice(&salt);
        combined.extend_from_slice(&iv);
        combined.extend_from_slice(tag);
        combined.extend_from_slice(ciphertext);

        Ok(EncryptedBlob(BASE64.encode(combined)))
    }

    /// Decrypts a blob produced by [`encrypt`](Self::encrypt).
    ///
    /// Fails with [`CryptoError::Decryption`] on a malformed blob, a
    /// tampered ciphertext or tag, or the wrong master key.
    pub fn decrypt(&self, blob: &EncryptedBlob) -> CryptoResult<String> {
        let combined = BASE64
            .decode(blob.as_str())
            .map_err(|e| CryptoError::Decryption(format!("invalid base64: {e}")))?;

        if combined.len() < HEADER_SIZE {
            return Err(CryptoError::Decryption(format!(
                "blob too short: {} bytes",
                combined.len()
            )));
        }

        let salt = &combined[..SALT_SIZE];
        let iv = &combined[SALT_SIZE..SALT_SIZE + IV_SIZE];
        let tag = &combined[SALT_SIZE + IV_SIZE..HEADER_SIZE];
        let ciphertext = &combined[HEADER_SIZE..];

        // Rebuild the ciphertext‖tag form aes-gcm expects
        let mut sealed = Vec::with_capacity(ciphertext.len() + TAG_SIZE);
        sealed.extend_from_slice(ciphertext);
        sealed.extend_from_slice(tag);

        let mut derived = self.derive_key(salt);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&derived));
        let plaintext = cipher
            .decrypt(Nonce::from_slice(iv), sealed.as_ref())
            .map_err(|_| {
                CryptoError::Decryption(
                    "authentication failed (wrong key or tampered blob)".to_string(),
                )
            });
        derived.zeroize();

        String::from_utf8(plaintext?)
            .map_err(|_| CryptoError::Decryption("plaintext is not valid UTF-8".to_string()))
    }

    fn derive_key(&self, salt: &[u8]) -> [u8; 32] {
        let mut derived = [0u8; 32];
        pbkdf2_hmac::<Sha256>(self.key.as_bytes(), salt, PBKDF2_ITERATIONS, &mut derived);
        derived
    }
}
