//! Wire types for the provider's storage-box REST API.
//!
//! Fields the API sometimes omits (or that older provider versions lack)
//! use `#[serde(default)]` so deserialization stays tolerant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A provider-side storage box.
#[derive(Clone, Debug, Deserialize)]
pub struct StorageBox {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub status: String,
    pub name: String,
    pub storage_box_type: StorageBoxType,
    pub location: Location,
    pub access_settings: BoxAccessSettings,
    pub server: String,
    #[serde(default)]
    pub system: String,
    pub stats: StorageBoxStats,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct StorageBoxType {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Quota in bytes.
    pub size: u64,
    #[serde(default)]
    pub subaccounts_limit: u32,
    #[serde(default)]
    pub snapshot_limit: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub network_zone: String,
}

/// Protocol flags on the main storage-box account.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BoxAccessSettings {
    #[serde(default)]
    pub reachable_externally: bool,
    #[serde(default)]
    pub samba_enabled: bool,
    #[serde(default)]
    pub ssh_enabled: bool,
    #[serde(default)]
    pub webdav_enabled: bool,
    #[serde(default)]
    pub zfs_enabled: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct StorageBoxStats {
    /// Used bytes (data + snapshots).
    pub size: u64,
    #[serde(default)]
    pub size_data: u64,
    #[serde(default)]
    pub size_snapshots: u64,
}

/// A provider-side subaccount.
#[derive(Clone, Debug, Deserialize)]
pub struct SubAccount {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub server: String,
    pub home_directory: String,
    pub access_settings: SubaccountAccessSettings,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    /// Parent storage box id.
    #[serde(default)]
    pub storage_box: i64,
}

/// Protocol flags on a subaccount.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SubaccountAccessSettings {
    #[serde(default)]
    pub samba_enabled: bool,
    #[serde(default)]
    pub ssh_enabled: bool,
    #[serde(default)]
    pub webdav_enabled: bool,
    #[serde(default)]
    pub reachable_externally: bool,
    #[serde(default)]
    pub readonly: bool,
}

/// Request body for creating a subaccount.
#[derive(Clone, Debug, Serialize)]
pub struct CreateSubaccountRequest {
    pub password: String,
    pub home_directory: String,
    pub access_settings: SubaccountAccessSettings,
    pub description: String,
}

/// Request body for updating a subaccount's description/labels.
#[derive(Clone, Debug, Serialize)]
pub struct UpdateSubaccountRequest {
    pub description: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

/// Request body for renaming/relabeling a storage box.
#[derive(Clone, Debug, Default, Serialize)]
pub struct UpdateStorageBoxRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

/// Partial access-settings update for the main account or a subaccount.
#[derive(Clone, Debug, Default, Serialize)]
pub struct AccessSettingsUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_directory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub samba_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webdav_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zfs_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readonly: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reachable_externally: Option<bool>,
}

/// The provider's asynchronous job handle for mutating operations.
///
/// Transient — drives reconciliation at call time, never persisted.
#[derive(Clone, Debug, Deserialize)]
pub struct ActionResponse {
    pub action: Action,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Action {
    pub id: i64,
    #[serde(default)]
    pub command: String,
    pub status: ActionStatus,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub started: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resources: Vec<ActionResource>,
    #[serde(default)]
    pub error: Option<ActionError>,
}

/// Pending is a first-class outcome, not a boolean.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    Running,
    Success,
    Error,
}

/// A resource reference created or touched by an action.
#[derive(Clone, Debug, Deserialize)]
pub struct ActionResource {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ActionError {
    #[serde(default)]
    pub code: String,
    pub message: String,
}

/// Resource type tag the provider uses for created subaccounts.
pub const SUBACCOUNT_RESOURCE_KIND: &str = "storage_box_subaccount";
