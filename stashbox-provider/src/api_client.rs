//! HTTP client for the provider's storage-box REST API.
//!
//! The single chokepoint through which all provider traffic flows. Handles
//! bearer authentication, structured error-body parsing, and the action
//! contract: an action reported as `error` raises immediately; `running`
//! is returned to the caller, because only the reconciliation engine knows
//! the acceptable wait budget for each call site. The client never polls.

use crate::config::ProviderConfig;
use crate::error::{SyncError, SyncResult};
use crate::settings::Settings;
use crate::types::*;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Shape of the provider's error bodies:
/// `{error: {message, details?: {fields: [{name, messages}]}}}`.
#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorInner,
}

#[derive(Deserialize)]
struct ApiErrorInner {
    message: String,
    #[serde(default)]
    details: Option<ApiErrorDetails>,
}

#[derive(Deserialize)]
struct ApiErrorDetails {
    #[serde(default)]
    fields: Vec<ApiFieldError>,
}

#[derive(Deserialize)]
struct ApiFieldError {
    name: String,
    #[serde(default)]
    messages: Vec<String>,
}

/// Typed wrapper over the provider's resource and action endpoints.
pub struct ProviderClient {
    client: Client,
    config: ProviderConfig,
    /// Token source for lazy resolution; absent when the token was given
    /// explicitly at construction.
    settings: Option<Arc<Settings>>,
    /// Cached for the lifetime of this client instance only, never across
    /// instances — a rotated token takes effect on the next request cycle.
    token: RwLock<Option<String>>,
}

impl ProviderClient {
    /// Client that resolves its bearer token lazily via [`Settings`] on the
    /// first request.
    pub fn new(config: ProviderConfig, settings: Arc<Settings>) -> Self {
        Self::build(config, Some(settings), None)
    }

    /// Client with an explicit bearer token. Used transiently to validate a
    /// token before persisting it.
    pub fn with_token(config: ProviderConfig, token: impl Into<String>) -> Self {
        Self::build(config, None, Some(token.into()))
    }

    fn build(
        config: ProviderConfig,
        settings: Option<Arc<Settings>>,
        token: Option<String>,
    ) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            config,
            settings,
            token: RwLock::new(token),
        }
    }

    async fn ensure_token(&self) -> SyncResult<String> {
        if let Some(token) = self.token.read().await.clone() {
            return Ok(token);
        }

        let settings = self.settings.as_ref().ok_or_else(|| {
            SyncError::Configuration("provider client has no token and no settings source".into())
        })?;
        let token = settings.provider_token().await?;

        *self.token.write().await = Some(token.clone());
        Ok(token)
    }

    async fn send(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&(impl Serialize + ?Sized)>,
    ) -> SyncResult<reqwest::Response> {
        let token = self.ensure_token().await?;
        let url = format!("{}{}", self.config.base_url, path);
        debug!("{method} {path}");

        let mut req = self.client.request(method, &url).bearer_auth(&token);
        if let Some(body) = body {
            req = req.json(body);
        }

        Ok(req.send().await?)
    }

    /// Deserializes a success body, or parses the provider's structured
    /// error body into [`SyncError::Provider`].
    async fn parse<T: DeserializeOwned>(resp: reqwest::Response) -> SyncResult<T> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json().await?);
        }

        let text = resp.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ApiErrorBody>(&text) {
            Ok(body) => {
                let mut message = body.error.message;
                let fields = body.error.details.map(|d| d.fields).unwrap_or_default();
                if !fields.is_empty() {
                    let detail = fields
                        .iter()
                        .map(|f| format!("{}: {}", f.name, f.messages.join(", ")))
                        .collect::<Vec<_>>()
                        .join("; ");
                    message.push_str(&format!(" - {detail}"));
                }
                message
            }
            Err(_) => format!("provider API error: {status} - {text}"),
        };

        Err(SyncError::Provider {
            status: status.as_u16(),
            message,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> SyncResult<T> {
        let resp = self
            .send(reqwest::Method::GET, path, None::<&()>)
            .await?;
        Self::parse(resp).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> SyncResult<T> {
        let resp = self.send(reqwest::Method::POST, path, Some(body)).await?;
        Self::parse(resp).await
    }

    async fn put_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> SyncResult<T> {
        let resp = self.send(reqwest::Method::PUT, path, Some(body)).await?;
        Self::parse(resp).await
    }

    async fn delete_json<T: DeserializeOwned>(&self, path: &str) -> SyncResult<T> {
        let resp = self
            .send(reqwest::Method::DELETE, path, None::<&()>)
            .await?;
        Self::parse(resp).await
    }

    /// Enforces the action contract: `error` status raises immediately with
    /// the provider's message; `running` and `success` pass through.
    fn accepted(resp: ActionResponse) -> SyncResult<ActionResponse> {
        if resp.action.status == ActionStatus::Error {
            let message = resp
                .action
                .error
                .map(|e| e.message)
                .unwrap_or_else(|| format!("action {} failed", resp.action.command));
            return Err(SyncError::Provider {
                status: 200,
                message,
            });
        }
        Ok(resp)
    }

    // ── Storage boxes ──

    pub async fn list_storage_boxes(&self) -> SyncResult<Vec<StorageBox>> {
        #[derive(Deserialize)]
        struct Resp {
            storage_boxes: Vec<StorageBox>,
        }
        let data: Resp = self.get_json("/storage_boxes").await?;
        Ok(data.storage_boxes)
    }

    pub async fn get_storage_box(&self, id: i64) -> SyncResult<StorageBox> {
        #[derive(Deserialize)]
        struct Resp {
            storage_box: StorageBox,
        }
        let data: Resp = self.get_json(&format!("/storage_boxes/{id}")).await?;
        Ok(data.storage_box)
    }

    pub async fn update_storage_box(
        &self,
        id: i64,
        updates: &UpdateStorageBoxRequest,
    ) -> SyncResult<StorageBox> {
        #[derive(Deserialize)]
        struct Resp {
            storage_box: StorageBox,
        }
        let data: Resp = self
            .put_json(&format!("/storage_boxes/{id}"), updates)
            .await?;
        Ok(data.storage_box)
    }

    // ── Subaccounts ──

    pub async fn list_subaccounts(&self, storage_box_id: i64) -> SyncResult<Vec<SubAccount>> {
        #[derive(Deserialize)]
        struct Resp {
            subaccounts: Vec<SubAccount>,
        }
        let data: Resp = self
            .get_json(&format!("/storage_boxes/{storage_box_id}/subaccounts"))
            .await?;
        Ok(data.subaccounts)
    }

    pub async fn create_subaccount(
        &self,
        storage_box_id: i64,
        params: &CreateSubaccountRequest,
    ) -> SyncResult<ActionResponse> {
        let resp: ActionResponse = self
            .post_json(
                &format!("/storage_boxes/{storage_box_id}/subaccounts"),
                params,
            )
            .await?;
        Self::accepted(resp)
    }

    pub async fn update_subaccount(
        &self,
        storage_box_id: i64,
        subaccount_id: i64,
        params: &UpdateSubaccountRequest,
    ) -> SyncResult<SubAccount> {
        #[derive(Deserialize)]
        struct Resp {
            subaccount: SubAccount,
        }
        let data: Resp = self
            .put_json(
                &format!("/storage_boxes/{storage_box_id}/subaccounts/{subaccount_id}"),
                params,
            )
            .await?;
        Ok(data.subaccount)
    }

    pub async fn delete_subaccount(
        &self,
        storage_box_id: i64,
        subaccount_id: i64,
    ) -> SyncResult<ActionResponse> {
        let resp: ActionResponse = self
            .delete_json(&format!(
                "/storage_boxes/{storage_box_id}/subaccounts/{subaccount_id}"
            ))
            .await?;
        Self::accepted(resp)
    }

    // ── Actions ──

    pub async fn reset_password(
        &self,
        storage_box_id: i64,
        password: &str,
    ) -> SyncResult<ActionResponse> {
        let resp: ActionResponse = self
            .post_json(
                &format!("/storage_boxes/{storage_box_id}/actions/reset_password"),
                &serde_json::json!({ "password": password }),
            )
            .await?;
        Self::accepted(resp)
    }

    pub async fn reset_subaccount_password(
        &self,
        storage_box_id: i64,
        subaccount_id: i64,
        password: &str,
    ) -> SyncResult<ActionResponse> {
        let resp: ActionResponse = self
            .post_json(
                &format!(
                    "/storage_boxes/{storage_box_id}/subaccounts/{subaccount_id}/actions/reset_subaccount_password"
                ),
                &serde_json::json!({ "password": password }),
            )
            .await?;
        Self::accepted(resp)
    }

    pub async fn update_access_settings(
        &self,
        storage_box_id: i64,
        settings: &AccessSettingsUpdate,
    ) -> SyncResult<ActionResponse> {
        let resp: ActionResponse = self
            .post_json(
                &format!("/storage_boxes/{storage_box_id}/actions/update_access_settings"),
                settings,
            )
            .await?;
        Self::accepted(resp)
    }

    pub async fn update_subaccount_access_settings(
        &self,
        storage_box_id: i64,
        subaccount_id: i64,
        settings: &AccessSettingsUpdate,
    ) -> SyncResult<ActionResponse> {
        let resp: ActionResponse = self
            .post_json(
                &format!(
                    "/storage_boxes/{storage_box_id}/subaccounts/{subaccount_id}/actions/update_access_settings"
                ),
                settings,
            )
            .await?;
        Self::accepted(resp)
    }

    // ── Connectivity ──

    /// Performs a cheap read and converts any failure into `false`.
    pub async fn test_connection(&self) -> bool {
        self.list_storage_boxes().await.is_ok()
    }
}

/// Validates a bearer token against the provider before it is persisted.
pub async fn test_provider_token(config: ProviderConfig, token: &str) -> bool {
    ProviderClient::with_token(config, token)
        .test_connection()
        .await
}
