//! Crypto error types.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur in encryption operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Master key missing or malformed. Fatal at startup, never retried.
    #[error("invalid crypto configuration: {0}")]
    Configuration(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Tag mismatch, wrong key, or malformed blob. Deliberately carries no
    /// detail about which — the distinction would leak oracle information.
    #[error("decryption failed: {0}")]
    Decryption(String),
}
