//! Provider synchronization core for Stashbox.
//!
//! Stashbox resells leased storage boxes on a third-party hosting provider,
//! giving each tenant scoped subaccounts. This crate is the part that is hard
//! to get right:
//! - Typed settings access with transparent encryption ([`Settings`])
//! - The single chokepoint for all provider API traffic ([`ProviderClient`])
//! - Diff-and-converge reconciliation against the provider's asynchronous
//!   action model ([`ReconcileEngine`])
//!
//! The provider executes mutations asynchronously: a create or reset returns
//! an action handle (`running | success | error`) and the created resource
//! becomes queryable only eventually. The engine owns the polling budget and
//! the placeholder fallback; the client never polls.

pub mod api_client;
pub mod config;
pub mod error;
pub mod reconcile;
pub mod settings;
pub mod types;

pub use api_client::{test_provider_token, ProviderClient};
pub use config::{ProviderConfig, ReconcileConfig};
pub use error::{SyncError, SyncResult};
pub use reconcile::{
    CreateOutcome, NewSubaccount, PasswordTarget, ReconcileEngine, SyncReport,
};
pub use settings::{Settings, PROVIDER_TOKEN_ENV, PROVIDER_TOKEN_KEY};
pub use types::*;
