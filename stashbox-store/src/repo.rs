//! Repository traits implemented by the persistence collaborator.

use crate::error::StoreResult;
use crate::records::{AuditEntry, SettingRecord, StorageBoxRecord, SubaccountRecord};
use async_trait::async_trait;
use uuid::Uuid;

/// CRUD over the `settings` table.
#[async_trait]
pub trait SettingsRepo: Send + Sync {
    async fn get(&self, key: &str) -> StoreResult<Option<SettingRecord>>;

    /// Upserts a setting. Last write wins; there is no versioning.
    async fn upsert(&self, record: SettingRecord) -> StoreResult<()>;
}

/// CRUD over the `storage_boxes` table.
#[async_trait]
pub trait BoxRepo: Send + Sync {
    async fn get(&self, id: Uuid) -> StoreResult<Option<StorageBoxRecord>>;

    /// Overwrites an existing record, keyed by its local id.
    async fn update(&self, record: StorageBoxRecord) -> StoreResult<StorageBoxRecord>;
}

/// CRUD over the `subaccounts` table, always scoped to a parent box.
#[async_trait]
pub trait SubaccountRepo: Send + Sync {
    async fn get(&self, id: Uuid) -> StoreResult<Option<SubaccountRecord>>;

    /// Lists subaccounts of a storage box, ordered by username.
    async fn list_for_box(&self, storage_box_id: Uuid) -> StoreResult<Vec<SubaccountRecord>>;

    async fn insert(&self, record: SubaccountRecord) -> StoreResult<SubaccountRecord>;

    async fn update(&self, record: SubaccountRecord) -> StoreResult<()>;

    /// Hard-deletes records of the given box whose provider ids are in the
    /// set. Returns the number of deleted rows.
    async fn delete_by_provider_ids(
        &self,
        storage_box_id: Uuid,
        provider_ids: &[i64],
    ) -> StoreResult<u64>;
}

/// Append-only API-call audit log.
#[async_trait]
pub trait AuditRepo: Send + Sync {
    async fn record(&self, entry: AuditEntry) -> StoreResult<()>;
}
