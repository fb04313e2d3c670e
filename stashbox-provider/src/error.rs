//! Sync error taxonomy.

use thiserror::Error;

/// Result type for provider and reconciliation operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur talking to the provider or converging local state.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Missing token or malformed configuration. Not retried.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The provider rejected the request. The message carries the provider's
    /// own wording plus any field-level validation details.
    #[error("provider rejected the request: {message}")]
    Provider { status: u16, message: String },

    /// Transport failure. The caller may retry manually.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The provider accepted an action but omitted an expected resource
    /// reference — a contract violation on their side.
    #[error("provider contract violation: {0}")]
    Integrity(String),

    /// The remote mutation succeeded but local persistence failed. Surfaced
    /// with an explicit warning so the operator knows manual reconciliation
    /// is needed; never silently swallowed.
    #[error("remote change applied but local persistence failed: {0}")]
    PartialFailure(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("crypto error: {0}")]
    Crypto(#[from] stashbox_crypto::CryptoError),

    #[error("store error: {0}")]
    Store(#[from] stashbox_store::StoreError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
