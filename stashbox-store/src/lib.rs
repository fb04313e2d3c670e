//! Persistence contracts for Stashbox.
//!
//! The database itself is an external collaborator; this crate defines the
//! records the core reads and writes, the repository traits the collaborator
//! implements, and an in-memory implementation used for first-run bootstrap
//! and as the test double.
//!
//! Records carry two identities: the provider-assigned numeric id (the
//! authoritative one, unique within its parent scope) and a local UUID
//! surrogate key for foreign-key relationships. Every local record is
//! traceable back to exactly one provider id.

mod error;
mod memory;
mod records;
mod repo;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use records::{
    AuditEntry, SettingRecord, StorageBoxRecord, SubaccountRecord,
};
pub use repo::{AuditRepo, BoxRepo, SettingsRepo, SubaccountRepo};
