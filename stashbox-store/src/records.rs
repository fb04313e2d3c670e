//! Record types mirrored from the persistence collaborator's tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stashbox_crypto::EncryptedBlob;
use uuid::Uuid;

/// A leased storage box mirrored locally.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageBoxRecord {
    /// Local surrogate key.
    pub id: Uuid,
    /// Provider-assigned id — the authoritative identity.
    pub provider_id: i64,
    pub name: String,
    /// Main account login on the provider side.
    pub login: String,
    pub location: String,
    pub product: String,
    pub server: String,
    /// Quota in whole gigabytes (floor of the provider's byte count).
    pub quota_gb: i64,
    /// Usage in whole gigabytes.
    pub used_gb: i64,
    pub password_encrypted: Option<EncryptedBlob>,
    pub last_synced_at: Option<DateTime<Utc>>,
}

/// A provider subaccount mirrored locally.
///
/// Invariant: `provider_id` is unique within the parent storage box.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubaccountRecord {
    pub id: Uuid,
    /// Parent storage box (local surrogate key).
    pub storage_box_id: Uuid,
    pub provider_id: i64,
    pub username: String,
    pub comment: String,
    pub home_dir: String,
    pub samba: bool,
    pub ssh: bool,
    pub webdav: bool,
    pub readonly: bool,
    pub external_reachability: bool,
    pub password_encrypted: Option<EncryptedBlob>,
    pub created_at: DateTime<Utc>,
}

/// A named configuration value, possibly encrypted at rest.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SettingRecord {
    pub key: String,
    pub value: String,
    pub encrypted: bool,
}

/// An audit-log row for a provider API call.
///
/// Audit writes are a non-critical side effect: failures are logged and
/// swallowed, never failing the primary operation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditEntry {
    pub storage_box_id: Uuid,
    pub endpoint: String,
    pub method: String,
    pub status_code: Option<u16>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn success(storage_box_id: Uuid, endpoint: impl Into<String>, method: &str) -> Self {
        Self {
            storage_box_id,
            endpoint: endpoint.into(),
            method: method.to_string(),
            status_code: Some(200),
            error_message: None,
            created_at: Utc::now(),
        }
    }

    pub fn failure(
        storage_box_id: Uuid,
        endpoint: impl Into<String>,
        method: &str,
        error: impl Into<String>,
    ) -> Self {
        Self {
            storage_box_id,
            endpoint: endpoint.into(),
            method: method.to_string(),
            status_code: None,
            error_message: Some(error.into()),
            created_at: Utc::now(),
        }
    }
}
