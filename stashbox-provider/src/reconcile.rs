//! Diff-and-converge reconciliation against the provider's action model.
//!
//! The provider executes mutations asynchronously and makes created
//! resources queryable only eventually. The engine's job is to never block a
//! request indefinitely, but also never silently drop a resource the
//! provider accepted: when the polling budget runs out it degrades to a
//! placeholder record (`pending-<id>`) and relies on the next full sync to
//! heal it.
//!
//! Mirrored attributes are not authoritative locally — full sync clobbers
//! them from the remote representation (provider wins).

use crate::api_client::ProviderClient;
use crate::config::ReconcileConfig;
use crate::error::{SyncError, SyncResult};
use crate::types::*;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use stashbox_crypto::CryptoBox;
use stashbox_store::{
    AuditEntry, AuditRepo, BoxRepo, StorageBoxRecord, SubaccountRecord, SubaccountRepo,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

const BYTES_PER_GB: u64 = 1024 * 1024 * 1024;

/// Converts a provider byte count to whole gigabytes (floor).
pub fn bytes_to_gb(bytes: u64) -> i64 {
    (bytes / BYTES_PER_GB) as i64
}

/// Parameters for creating a subaccount, as entered by the caller.
#[derive(Clone, Debug)]
pub struct NewSubaccount {
    pub password: String,
    pub home_dir: String,
    pub comment: String,
    pub samba: bool,
    pub ssh: bool,
    pub webdav: bool,
    pub readonly: bool,
    pub external_reachability: bool,
}

/// Result of a create-subaccount run.
#[derive(Clone, Debug)]
pub struct CreateOutcome {
    pub record: SubaccountRecord,
    /// Action status at submission time (`Running` or `Success`; `Error`
    /// never reaches here).
    pub provider_status: ActionStatus,
    pub provider_id: i64,
    pub message: String,
}

/// Counts and final records from a full subaccount sync.
#[derive(Clone, Debug)]
pub struct SyncReport {
    pub records: Vec<SubaccountRecord>,
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
}

/// Which credential a password reset targets.
#[derive(Clone, Copy, Debug)]
pub enum PasswordTarget {
    /// The storage box's main account, by local box id.
    MainAccount(Uuid),
    /// A subaccount, by local subaccount id.
    Subaccount(Uuid),
}

/// Keeps local subaccount/storage-box state consistent with authoritative
/// provider state.
pub struct ReconcileEngine {
    api: Arc<ProviderClient>,
    crypto: Arc<CryptoBox>,
    boxes: Arc<dyn BoxRepo>,
    subaccounts: Arc<dyn SubaccountRepo>,
    audit: Arc<dyn AuditRepo>,
    config: ReconcileConfig,
}

impl ReconcileEngine {
    pub fn new(
        api: Arc<ProviderClient>,
        crypto: Arc<CryptoBox>,
        boxes: Arc<dyn BoxRepo>,
        subaccounts: Arc<dyn SubaccountRepo>,
        audit: Arc<dyn AuditRepo>,
        config: ReconcileConfig,
    ) -> Self {
        Self {
            api,
            crypto,
            boxes,
            subaccounts,
            audit,
            config,
        }
    }

    /// Creates a subaccount on the provider and mirrors it locally.
    ///
    /// State machine: submit → on `error` fail with the provider message →
    /// extract the provisional resource id → poll the subaccount list with
    /// exponential backoff → merge remote attributes, or degrade to a
    /// `pending-<id>` placeholder when the budget runs out.
    pub async fn create_subaccount(
        &self,
        storage_box_id: Uuid,
        params: NewSubaccount,
    ) -> SyncResult<CreateOutcome> {
        let bx = self.load_box(storage_box_id).await?;
        let endpoint = format!("/storage_boxes/{}/subaccounts", bx.provider_id);

        let request = CreateSubaccountRequest {
            password: params.password.clone(),
            home_directory: params.home_dir.clone(),
            access_settings: SubaccountAccessSettings {
                samba_enabled: params.samba,
                ssh_enabled: params.ssh,
                webdav_enabled: params.webdav,
                reachable_externally: params.external_reachability,
                readonly: params.readonly,
            },
            description: params.comment.clone(),
        };

        let action = match self.api.create_subaccount(bx.provider_id, &request).await {
            Ok(resp) => resp.action,
            Err(e) => {
                let e = with_password_hint(e);
                self.audit(AuditEntry::failure(bx.id, &endpoint, "POST", e.to_string()))
                    .await;
                return Err(e);
            }
        };

        // The provider is expected to always reference the created resource.
        let provider_id = match action
            .resources
            .iter()
            .find(|r| r.kind == SUBACCOUNT_RESOURCE_KIND)
            .map(|r| r.id)
        {
            Some(id) => id,
            None => {
                let e = SyncError::Integrity(
                    "create action carried no subaccount resource reference".into(),
                );
                self.audit(AuditEntry::failure(bx.id, &endpoint, "POST", e.to_string()))
                    .await;
                return Err(e);
            }
        };

        let remote = self.await_subaccount(bx.provider_id, provider_id).await;
        let found = remote.is_some();

        let record = match remote {
            Some(sub) => SubaccountRecord {
                id: Uuid::new_v4(),
                storage_box_id: bx.id,
                provider_id,
                username: sub.username,
                comment: sub.description,
                home_dir: sub.home_directory,
                samba: sub.access_settings.samba_enabled,
                ssh: sub.access_settings.ssh_enabled,
                webdav: sub.access_settings.webdav_enabled,
                readonly: sub.access_settings.readonly,
                external_reachability: sub.access_settings.reachable_externally,
                password_encrypted: Some(self.crypto.encrypt(&params.password)?),
                created_at: Utc::now(),
            },
            None => {
                // The provider accepted the resource but it is not yet
                // queryable. Insert a stand-in so the local store is never
                // missing an entry; the next full sync fills in the real
                // username.
                warn!(
                    "subaccount {provider_id} not visible after {} poll attempts, \
                     inserting placeholder",
                    self.config.poll_attempts
                );
                SubaccountRecord {
                    id: Uuid::new_v4(),
                    storage_box_id: bx.id,
                    provider_id,
                    username: format!("pending-{provider_id}"),
                    comment: params.comment.clone(),
                    home_dir: params.home_dir.clone(),
                    samba: params.samba,
                    ssh: params.ssh,
                    webdav: params.webdav,
                    readonly: params.readonly,
                    external_reachability: params.external_reachability,
                    password_encrypted: Some(self.crypto.encrypt(&params.password)?),
                    created_at: Utc::now(),
                }
            }
        };

        // Remote creation already happened; a local insert failure is a
        // partial failure the operator must hear about.
        let saved = self.subaccounts.insert(record).await.map_err(|e| {
            SyncError::PartialFailure(format!(
                "subaccount {provider_id} created on provider but local insert failed: {e}"
            ))
        })?;

        self.audit(AuditEntry::success(bx.id, &endpoint, "POST")).await;
        info!(
            "created subaccount {} (provider id {provider_id}) in box {}",
            saved.username, bx.provider_id
        );

        Ok(CreateOutcome {
            record: saved,
            provider_status: action.status,
            provider_id,
            message: if found {
                "Subaccount created successfully".to_string()
            } else {
                "Subaccount creation initiated on the provider. Username will be updated \
                 automatically."
                    .to_string()
            },
        })
    }

    /// Polls the subaccount list with exponential backoff until the given
    /// provider id becomes visible or the budget runs out.
    async fn await_subaccount(&self, box_provider_id: i64, provider_id: i64) -> Option<SubAccount> {
        for attempt in 0..self.config.poll_attempts {
            let delay = self.config.poll_delay(attempt);
            debug!(
                "poll attempt {}/{}: waiting {delay:?} for subaccount {provider_id}",
                attempt + 1,
                self.config.poll_attempts
            );
            tokio::time::sleep(delay).await;

            match self.api.list_subaccounts(box_provider_id).await {
                Ok(subaccounts) => {
                    if let Some(found) = subaccounts.into_iter().find(|s| s.id == provider_id) {
                        return Some(found);
                    }
                }
                Err(e) => warn!("poll attempt {} failed: {e}", attempt + 1),
            }
        }
        None
    }

    /// Three-way set reconciliation between the provider's subaccount set
    /// and the local mirror: insert missing, overwrite intersecting
    /// (provider wins), hard-delete local orphans. Idempotent.
    pub async fn sync_subaccounts(&self, storage_box_id: Uuid) -> SyncResult<SyncReport> {
        let bx = self.load_box(storage_box_id).await?;
        let endpoint = format!("/storage_boxes/{}/subaccounts", bx.provider_id);

        let remote = match self.api.list_subaccounts(bx.provider_id).await {
            Ok(list) => list,
            Err(e) => {
                self.audit(AuditEntry::failure(bx.id, &endpoint, "GET", e.to_string()))
                    .await;
                return Err(e);
            }
        };

        let local = self.subaccounts.list_for_box(bx.id).await?;
        let local_by_provider: HashMap<i64, &SubaccountRecord> =
            local.iter().map(|r| (r.provider_id, r)).collect();
        let remote_ids: HashSet<i64> = remote.iter().map(|s| s.id).collect();

        let mut created = 0;
        let mut updated = 0;

        for sub in &remote {
            match local_by_provider.get(&sub.id) {
                None => {
                    self.subaccounts
                        .insert(SubaccountRecord {
                            id: Uuid::new_v4(),
                            storage_box_id: bx.id,
                            provider_id: sub.id,
                            username: sub.username.clone(),
                            comment: sub.description.clone(),
                            home_dir: sub.home_directory.clone(),
                            samba: sub.access_settings.samba_enabled,
                            ssh: sub.access_settings.ssh_enabled,
                            webdav: sub.access_settings.webdav_enabled,
                            readonly: sub.access_settings.readonly,
                            external_reachability: sub.access_settings.reachable_externally,
                            password_encrypted: None,
                            created_at: Utc::now(),
                        })
                        .await?;
                    created += 1;
                }
                Some(existing) if mirror_differs(existing, sub) => {
                    let mut record = (*existing).clone();
                    record.username = sub.username.clone();
                    record.comment = sub.description.clone();
                    record.home_dir = sub.home_directory.clone();
                    record.samba = sub.access_settings.samba_enabled;
                    record.ssh = sub.access_settings.ssh_enabled;
                    record.webdav = sub.access_settings.webdav_enabled;
                    record.readonly = sub.access_settings.readonly;
                    record.external_reachability = sub.access_settings.reachable_externally;
                    self.subaccounts.update(record).await?;
                    updated += 1;
                }
                Some(_) => {} // unchanged, no write
            }
        }

        let orphaned: Vec<i64> = local
            .iter()
            .map(|r| r.provider_id)
            .filter(|id| !remote_ids.contains(id))
            .collect();
        let deleted = if orphaned.is_empty() {
            0
        } else {
            self.subaccounts
                .delete_by_provider_ids(bx.id, &orphaned)
                .await? as usize
        };

        self.audit(AuditEntry::success(bx.id, &endpoint, "GET")).await;
        info!(
            "synced subaccounts for box {}: {created} created, {updated} updated, \
             {deleted} deleted",
            bx.provider_id
        );

        Ok(SyncReport {
            records: self.subaccounts.list_for_box(bx.id).await?,
            created,
            updated,
            deleted,
        })
    }

    /// Overwrites the local storage-box mirror from the provider's current
    /// representation and bumps the sync timestamp.
    pub async fn sync_storage_box(&self, storage_box_id: Uuid) -> SyncResult<StorageBoxRecord> {
        let mut bx = self.load_box(storage_box_id).await?;
        let endpoint = format!("/storage_boxes/{}", bx.provider_id);

        let remote = match self.api.get_storage_box(bx.provider_id).await {
            Ok(b) => b,
            Err(e) => {
                self.audit(AuditEntry::failure(bx.id, &endpoint, "GET", e.to_string()))
                    .await;
                return Err(e);
            }
        };

        bx.name = remote.name;
        bx.login = remote.username;
        bx.location = remote.location.name;
        bx.product = remote.storage_box_type.name;
        bx.server = remote.server;
        bx.quota_gb = bytes_to_gb(remote.storage_box_type.size);
        bx.used_gb = bytes_to_gb(remote.stats.size);
        bx.last_synced_at = Some(Utc::now());

        let saved = self.boxes.update(bx).await?;
        self.audit(AuditEntry::success(saved.id, &endpoint, "GET"))
            .await;
        Ok(saved)
    }

    /// Resets the main-account or a subaccount password on the provider and
    /// persists the encrypted new password locally.
    ///
    /// Reset actions are fire-and-forget once accepted: `running` and
    /// `success` both count as provisional success. A rejected reset leaves
    /// local state untouched, so local and remote never disagree.
    pub async fn reset_password(
        &self,
        target: PasswordTarget,
        new_password: &str,
    ) -> SyncResult<()> {
        match target {
            PasswordTarget::MainAccount(box_id) => {
                let mut bx = self.load_box(box_id).await?;
                let endpoint = format!("/storage_boxes/{}/actions/reset_password", bx.provider_id);

                if let Err(e) = self.api.reset_password(bx.provider_id, new_password).await {
                    self.audit(AuditEntry::failure(bx.id, &endpoint, "POST", e.to_string()))
                        .await;
                    return Err(e);
                }

                bx.password_encrypted = Some(self.crypto.encrypt(new_password)?);
                let box_id = bx.id;
                self.boxes.update(bx).await.map_err(|e| {
                    SyncError::PartialFailure(format!(
                        "password reset on provider but local persistence failed: {e}"
                    ))
                })?;

                self.audit(AuditEntry::success(box_id, &endpoint, "POST"))
                    .await;
                Ok(())
            }
            PasswordTarget::Subaccount(subaccount_id) => {
                let mut record = self
                    .subaccounts
                    .get(subaccount_id)
                    .await?
                    .ok_or_else(|| SyncError::NotFound(format!("subaccount {subaccount_id}")))?;
                let bx = self.load_box(record.storage_box_id).await?;
                let endpoint = format!(
                    "/storage_boxes/{}/subaccounts/{}/actions/reset_subaccount_password",
                    bx.provider_id, record.provider_id
                );

                if let Err(e) = self
                    .api
                    .reset_subaccount_password(bx.provider_id, record.provider_id, new_password)
                    .await
                {
                    self.audit(AuditEntry::failure(bx.id, &endpoint, "POST", e.to_string()))
                        .await;
                    return Err(e);
                }

                record.password_encrypted = Some(self.crypto.encrypt(new_password)?);
                self.subaccounts.update(record).await.map_err(|e| {
                    SyncError::PartialFailure(format!(
                        "password reset on provider but local persistence failed: {e}"
                    ))
                })?;

                self.audit(AuditEntry::success(bx.id, &endpoint, "POST"))
                    .await;
                Ok(())
            }
        }
    }

    async fn load_box(&self, id: Uuid) -> SyncResult<StorageBoxRecord> {
        self.boxes
            .get(id)
            .await?
            .ok_or_else(|| SyncError::NotFound(format!("storage box {id}")))
    }

    /// Audit writes are a non-critical side effect — failures are logged
    /// and swallowed.
    async fn audit(&self, entry: AuditEntry) {
        if let Err(e) = self.audit.record(entry).await {
            warn!("audit log write failed: {e}");
        }
    }
}

/// True when any mirrored attribute differs from the remote representation.
fn mirror_differs(local: &SubaccountRecord, remote: &SubAccount) -> bool {
    local.username != remote.username
        || local.comment != remote.description
        || local.home_dir != remote.home_directory
        || local.samba != remote.access_settings.samba_enabled
        || local.ssh != remote.access_settings.ssh_enabled
        || local.webdav != remote.access_settings.webdav_enabled
        || local.readonly != remote.access_settings.readonly
        || local.external_reachability != remote.access_settings.reachable_externally
}

/// The provider rejects passwords failing undocumented composition rules;
/// append a hint when its message points at the password.
fn with_password_hint(err: SyncError) -> SyncError {
    match err {
        SyncError::Provider { status, message }
            if message.to_lowercase().contains("password") =>
        {
            SyncError::Provider {
                status,
                message: format!(
                    "{message}. Try using a different password (20+ characters, \
                     alphanumeric only)."
                ),
            }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::bytes_to_gb;

    #[test]
    fn gb_conversion_floors() {
        assert_eq!(bytes_to_gb(5_368_709_120), 5);
        assert_eq!(bytes_to_gb(5_368_709_119), 4);
        assert_eq!(bytes_to_gb(0), 0);
    }
}
