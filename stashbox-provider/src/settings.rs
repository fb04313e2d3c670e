//! Typed access to named configuration values, some sensitive.
//!
//! Values marked encrypted are stored as [`EncryptedBlob`]s and decrypted
//! transparently on read. Nothing is cached across calls: an administrator
//! rotating the provider token must see the new value on the very next
//! provider request.

use crate::error::{SyncError, SyncResult};
use std::sync::Arc;
use stashbox_crypto::{CryptoBox, EncryptedBlob};
use stashbox_store::{SettingRecord, SettingsRepo};
use tracing::{debug, warn};

/// Settings key under which the provider bearer token is persisted.
pub const PROVIDER_TOKEN_KEY: &str = "provider_api_token";

/// Environment variable fallback for the provider bearer token.
pub const PROVIDER_TOKEN_ENV: &str = "PROVIDER_API_TOKEN";

/// Typed get/set over encrypted and plaintext configuration values.
pub struct Settings {
    repo: Arc<dyn SettingsRepo>,
    crypto: Arc<CryptoBox>,
}

impl Settings {
    pub fn new(repo: Arc<dyn SettingsRepo>, crypto: Arc<CryptoBox>) -> Self {
        Self { repo, crypto }
    }

    /// Reads a named value, transparently decrypting if it is marked
    /// encrypted.
    ///
    /// A value that fails to decrypt (rotated master key, corrupted blob) is
    /// treated as unavailable rather than an error, so broken ciphertext
    /// does not crash read paths that merely display settings.
    pub async fn get(&self, key: &str) -> SyncResult<Option<String>> {
        let Some(record) = self.repo.get(key).await? else {
            return Ok(None);
        };

        if record.encrypted && !record.value.is_empty() {
            match self
                .crypto
                .decrypt(&EncryptedBlob::from_encoded(record.value))
            {
                Ok(plaintext) => Ok(Some(plaintext)),
                Err(e) => {
                    warn!("setting {key} failed to decrypt, treating as unset: {e}");
                    Ok(None)
                }
            }
        } else {
            Ok(Some(record.value))
        }
    }

    /// Upserts a value, encrypting it first when `encrypted` is set.
    /// Last write wins; there is no versioning.
    pub async fn set(&self, key: &str, value: &str, encrypted: bool) -> SyncResult<()> {
        let stored = if encrypted {
            self.crypto.encrypt(value)?.as_str().to_string()
        } else {
            value.to_string()
        };

        self.repo
            .upsert(SettingRecord {
                key: key.to_string(),
                value: stored,
                encrypted,
            })
            .await?;
        Ok(())
    }

    /// Resolves the provider bearer token.
    ///
    /// Resolution order: persisted encrypted setting, then the
    /// `PROVIDER_API_TOKEN` environment variable. If neither is present this
    /// is a hard configuration failure — there is deliberately no baked-in
    /// default token.
    pub async fn provider_token(&self) -> SyncResult<String> {
        if let Some(token) = self.get(PROVIDER_TOKEN_KEY).await? {
            if !token.is_empty() {
                debug!("provider token resolved from settings");
                return Ok(token);
            }
        }

        if let Ok(token) = std::env::var(PROVIDER_TOKEN_ENV) {
            if !token.is_empty() {
                debug!("provider token resolved from {PROVIDER_TOKEN_ENV}");
                return Ok(token);
            }
        }

        Err(SyncError::Configuration(format!(
            "provider API token not configured; set it in admin settings or {PROVIDER_TOKEN_ENV}"
        )))
    }
}
