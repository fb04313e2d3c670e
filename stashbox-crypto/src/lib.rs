//! Encryption layer for Stashbox.
//!
//! Guards at-rest secrets (storage-box passwords, provider API tokens) using:
//! - PBKDF2-HMAC-SHA256 for per-value key derivation from the master key
//! - AES-256-GCM for authenticated encryption
//! - Secure key handling with zeroization
//!
//! # Architecture
//!
//! A single process-wide master key (32 raw bytes, hex-encoded in
//! configuration) is loaded once at startup and passed by handle into every
//! component that needs it. Each `encrypt` call derives a fresh key from the
//! master key and a random 64-byte salt, so two encryptions of the same
//! plaintext never produce the same blob. The salt, nonce, and authentication
//! tag travel inside the blob; decryption needs only the master key.
//!
//! Any tampering with a blob (flipped bit, truncation, wrong key) fails the
//! GCM tag check and surfaces as [`CryptoError::Decryption`].

mod cipher;
mod error;
mod key;

pub use cipher::{
    CryptoBox, EncryptedBlob, IV_SIZE, PBKDF2_ITERATIONS, SALT_SIZE, TAG_SIZE,
};
pub use error::{CryptoError, CryptoResult};
pub use key::{MasterKey, ENCRYPTION_KEY_ENV, KEY_SIZE};
