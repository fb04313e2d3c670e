//! Master key loading and handling.

use crate::error::{CryptoError, CryptoResult};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Master key length in raw bytes.
pub const KEY_SIZE: usize = 32;

/// Environment variable holding the hex-encoded master key.
pub const ENCRYPTION_KEY_ENV: &str = "ENCRYPTION_KEY";

/// The process-wide master encryption key.
///
/// Loaded once at startup and passed by reference into every component that
/// needs it; there is no lazy global. Zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct MasterKey([u8; KEY_SIZE]);

impl MasterKey {
    /// Parses a master key from its hex encoding (64 hex characters).
    pub fn from_hex(encoded: &str) -> CryptoResult<Self> {
        let bytes = hex::decode(encoded.trim()).map_err(|e| {
            CryptoError::Configuration(format!("master key is not valid hex: {e}"))
        })?;

        if bytes.len() != KEY_SIZE {
            return Err(CryptoError::Configuration(format!(
                "master key must be exactly {KEY_SIZE} bytes, got {}",
                bytes.len()
            )));
        }

        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(&bytes);
        Ok(Self(key))
    }

    /// Loads the master key from the `ENCRYPTION_KEY` environment variable.
    ///
    /// Fails fast with [`CryptoError::Configuration`] if the variable is
    /// absent or does not decode to exactly 32 bytes.
    pub fn from_env() -> CryptoResult<Self> {
        let encoded = std::env::var(ENCRYPTION_KEY_ENV).map_err(|_| {
            CryptoError::Configuration(format!("{ENCRYPTION_KEY_ENV} is not set"))
        })?;
        Self::from_hex(&encoded)
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material
        f.write_str("MasterKey(..)")
    }
}
