use std::sync::Arc;
use stashbox_crypto::{CryptoBox, MasterKey};
use stashbox_provider::{
    test_provider_token, ProviderClient, ProviderConfig, Settings, SyncError,
};
use stashbox_store::{MemoryStore, SettingsRepo};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer) -> ProviderConfig {
    ProviderConfig {
        base_url: server.uri(),
        timeout_secs: 5,
    }
}

fn client(server: &MockServer) -> ProviderClient {
    ProviderClient::with_token(config(server), "test-token")
}

fn storage_box_json(id: i64) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "username": format!("u{id}"),
        "status": "active",
        "name": format!("bx-{id}"),
        "storage_box_type": { "name": "BX21", "size": 5_368_709_120u64 },
        "location": { "id": 1, "name": "fsn1", "country": "DE", "city": "Falkenstein" },
        "access_settings": {
            "reachable_externally": false,
            "samba_enabled": true,
            "ssh_enabled": true,
            "webdav_enabled": false,
            "zfs_enabled": false
        },
        "server": format!("u{id}.your-storagebox.de"),
        "system": "FSN1-BX355",
        "stats": { "size": 2_147_483_648u64, "size_data": 2_147_483_648u64, "size_snapshots": 0 },
        "labels": {},
        "created": "2025-01-01T00:00:00Z"
    })
}

fn subaccount_json(id: i64, username: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "username": username,
        "server": "u1.your-storagebox.de",
        "home_directory": format!("/home/{username}"),
        "access_settings": {
            "samba_enabled": false,
            "ssh_enabled": true,
            "webdav_enabled": false,
            "reachable_externally": false,
            "readonly": false
        },
        "description": "tenant share",
        "created": "2025-01-02T00:00:00Z",
        "labels": {},
        "storage_box": 1
    })
}

// ── Resource reads ──

#[tokio::test]
async fn list_storage_boxes_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/storage_boxes"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "storage_boxes": [storage_box_json(1), storage_box_json(2)]
        })))
        .mount(&server)
        .await;

    let boxes = client(&server).list_storage_boxes().await.unwrap();
    assert_eq!(boxes.len(), 2);
    assert_eq!(boxes[0].username, "u1");
    assert_eq!(boxes[0].storage_box_type.size, 5_368_709_120);
}

#[tokio::test]
async fn get_storage_box_unwraps_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/storage_boxes/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "storage_box": storage_box_json(1)
        })))
        .mount(&server)
        .await;

    let bx = client(&server).get_storage_box(1).await.unwrap();
    assert_eq!(bx.id, 1);
    assert_eq!(bx.location.name, "fsn1");
}

#[tokio::test]
async fn list_subaccounts_unwraps_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/storage_boxes/1/subaccounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "subaccounts": [subaccount_json(10, "u1-sub1")]
        })))
        .mount(&server)
        .await;

    let subs = client(&server).list_subaccounts(1).await.unwrap();
    assert_eq!(subs.len(), 1);
    assert_eq!(subs[0].home_directory, "/home/u1-sub1");
}

// ── Error bodies ──

#[tokio::test]
async fn structured_error_body_includes_field_details() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/storage_boxes/9"))
        .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
            "error": {
                "message": "invalid input",
                "details": {
                    "fields": [
                        { "name": "password", "messages": ["too short", "needs digits"] },
                        { "name": "home_directory", "messages": ["required"] }
                    ]
                }
            }
        })))
        .mount(&server)
        .await;

    let err = client(&server).get_storage_box(9).await.unwrap_err();
    match err {
        SyncError::Provider { status, message } => {
            assert_eq!(status, 422);
            assert_eq!(
                message,
                "invalid input - password: too short, needs digits; home_directory: required"
            );
        }
        other => panic!("expected SyncError::Provider, got: {other:?}"),
    }
}

#[tokio::test]
async fn unparseable_error_body_falls_back_to_raw_text() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/storage_boxes"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let err = client(&server).list_storage_boxes().await.unwrap_err();
    match err {
        SyncError::Provider { status, message } => {
            assert_eq!(status, 502);
            assert!(message.contains("bad gateway"));
        }
        other => panic!("expected SyncError::Provider, got: {other:?}"),
    }
}

#[tokio::test]
async fn transport_failure_is_a_network_error() {
    // Nothing listens here
    let config = ProviderConfig {
        base_url: "http://127.0.0.1:9".into(),
        timeout_secs: 1,
    };
    let client = ProviderClient::with_token(config, "test-token");
    let err = client.list_storage_boxes().await.unwrap_err();
    assert!(matches!(err, SyncError::Network(_)));
}

// ── Action contract ──

#[tokio::test]
async fn action_error_status_raises_immediately() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/storage_boxes/1/actions/reset_password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "action": {
                "id": 501,
                "command": "reset_password",
                "status": "error",
                "resources": [],
                "error": { "code": "invalid_input", "message": "password rejected" }
            }
        })))
        .mount(&server)
        .await;

    let err = client(&server).reset_password(1, "pw").await.unwrap_err();
    match err {
        SyncError::Provider { message, .. } => assert_eq!(message, "password rejected"),
        other => panic!("expected SyncError::Provider, got: {other:?}"),
    }
}

#[tokio::test]
async fn action_running_passes_through_with_resources() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/storage_boxes/1/subaccounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "action": {
                "id": 502,
                "command": "create_subaccount",
                "status": "running",
                "resources": [{ "id": 77, "type": "storage_box_subaccount" }]
            }
        })))
        .mount(&server)
        .await;

    let req = stashbox_provider::CreateSubaccountRequest {
        password: "pw-123456789012345678".into(),
        home_directory: "/home/sub".into(),
        access_settings: Default::default(),
        description: String::new(),
    };
    let resp = client(&server).create_subaccount(1, &req).await.unwrap();
    assert_eq!(resp.action.status, stashbox_provider::ActionStatus::Running);
    assert_eq!(resp.action.resources[0].id, 77);
}

// ── Token resolution ──

#[tokio::test]
async fn lazy_token_comes_from_settings() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/storage_boxes"))
        .and(header("authorization", "Bearer tok-from-settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "storage_boxes": []
        })))
        .mount(&server)
        .await;

    let key = MasterKey::from_hex(&hex::encode([0x42u8; 32])).unwrap();
    let crypto = Arc::new(CryptoBox::new(key));
    let store = Arc::new(MemoryStore::new());
    let settings = Settings::new(store as Arc<dyn SettingsRepo>, crypto);
    settings
        .set("provider_api_token", "tok-from-settings", true)
        .await
        .unwrap();

    let client = ProviderClient::new(config(&server), Arc::new(settings));
    assert!(client.list_storage_boxes().await.unwrap().is_empty());
}

// ── Connectivity probe ──

#[tokio::test]
async fn test_connection_true_on_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/storage_boxes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "storage_boxes": []
        })))
        .mount(&server)
        .await;

    assert!(test_provider_token(config(&server), "any-token").await);
}

#[tokio::test]
async fn test_connection_false_on_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/storage_boxes"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": { "message": "unauthorized" }
        })))
        .mount(&server)
        .await;

    assert!(!test_provider_token(config(&server), "bad-token").await);
}
