//! In-memory store for bootstrap and tests.

use crate::error::{StoreError, StoreResult};
use crate::records::{AuditEntry, SettingRecord, StorageBoxRecord, SubaccountRecord};
use crate::repo::{AuditRepo, BoxRepo, SettingsRepo, SubaccountRepo};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// A `Mutex<HashMap>` implementation of every repository trait.
///
/// Used before a real database is configured and as the test double. Not
/// durable; everything is lost on drop.
#[derive(Default)]
pub struct MemoryStore {
    settings: Mutex<HashMap<String, SettingRecord>>,
    boxes: Mutex<HashMap<Uuid, StorageBoxRecord>>,
    subaccounts: Mutex<HashMap<Uuid, SubaccountRecord>>,
    audit: Mutex<Vec<AuditEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a storage box record (test/bootstrap helper).
    pub fn put_box(&self, record: StorageBoxRecord) {
        self.boxes.lock().unwrap().insert(record.id, record);
    }

    /// Seeds a subaccount record (test/bootstrap helper).
    pub fn put_subaccount(&self, record: SubaccountRecord) {
        self.subaccounts.lock().unwrap().insert(record.id, record);
    }

    /// Snapshot of recorded audit entries.
    pub fn audit_entries(&self) -> Vec<AuditEntry> {
        self.audit.lock().unwrap().clone()
    }
}

#[async_trait]
impl SettingsRepo for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<SettingRecord>> {
        Ok(self.settings.lock().unwrap().get(key).cloned())
    }

    async fn upsert(&self, record: SettingRecord) -> StoreResult<()> {
        self.settings
            .lock()
            .unwrap()
            .insert(record.key.clone(), record);
        Ok(())
    }
}

#[async_trait]
impl BoxRepo for MemoryStore {
    async fn get(&self, id: Uuid) -> StoreResult<Option<StorageBoxRecord>> {
        Ok(self.boxes.lock().unwrap().get(&id).cloned())
    }

    async fn update(&self, record: StorageBoxRecord) -> StoreResult<StorageBoxRecord> {
        let mut boxes = self.boxes.lock().unwrap();
        if !boxes.contains_key(&record.id) {
            return Err(StoreError::NotFound(format!("storage box {}", record.id)));
        }
        boxes.insert(record.id, record.clone());
        Ok(record)
    }
}

#[async_trait]
impl SubaccountRepo for MemoryStore {
    async fn get(&self, id: Uuid) -> StoreResult<Option<SubaccountRecord>> {
        Ok(self.subaccounts.lock().unwrap().get(&id).cloned())
    }

    async fn list_for_box(&self, storage_box_id: Uuid) -> StoreResult<Vec<SubaccountRecord>> {
        let mut records: Vec<_> = self
            .subaccounts
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.storage_box_id == storage_box_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(records)
    }

    async fn insert(&self, record: SubaccountRecord) -> StoreResult<SubaccountRecord> {
        let mut subaccounts = self.subaccounts.lock().unwrap();
        let duplicate = subaccounts.values().any(|r| {
            r.storage_box_id == record.storage_box_id && r.provider_id == record.provider_id
        });
        if duplicate {
            return Err(StoreError::Unavailable(format!(
                "provider id {} already present in box {}",
                record.provider_id, record.storage_box_id
            )));
        }
        subaccounts.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update(&self, record: SubaccountRecord) -> StoreResult<()> {
        let mut subaccounts = self.subaccounts.lock().unwrap();
        if !subaccounts.contains_key(&record.id) {
            return Err(StoreError::NotFound(format!("subaccount {}", record.id)));
        }
        subaccounts.insert(record.id, record);
        Ok(())
    }

    async fn delete_by_provider_ids(
        &self,
        storage_box_id: Uuid,
        provider_ids: &[i64],
    ) -> StoreResult<u64> {
        let mut subaccounts = self.subaccounts.lock().unwrap();
        let before = subaccounts.len();
        subaccounts.retain(|_, r| {
            !(r.storage_box_id == storage_box_id && provider_ids.contains(&r.provider_id))
        });
        Ok((before - subaccounts.len()) as u64)
    }
}

#[async_trait]
impl AuditRepo for MemoryStore {
    async fn record(&self, entry: AuditEntry) -> StoreResult<()> {
        self.audit.lock().unwrap().push(entry);
        Ok(())
    }
}
