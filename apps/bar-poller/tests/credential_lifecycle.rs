//! Credential Lifecycle Integration Tests
//!
//! Wires `CredentialManager` to a real credential file and a mock token
//! endpoint.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bar_poller::{
    Clock, CredentialError, CredentialManager, FileTokenStore, HttpTokenRefresher,
    OAuthClientConfig, RefreshError, RetryPolicy, TokenStorePort,
};

const NOW: i64 = 1_700_000_000;

struct FixedClock(i64);

impl Clock for FixedClock {
    fn now_epoch_secs(&self) -> i64 {
        self.0
    }
}

type Manager = CredentialManager<FileTokenStore, HttpTokenRefresher, FixedClock>;

fn manager(server: &MockServer, store: &Arc<FileTokenStore>) -> Manager {
    let clock = Arc::new(FixedClock(NOW));
    let config = OAuthClientConfig::new(format!("{}/token", server.uri()), "client", "secret");
    let refresher = HttpTokenRefresher::new(config, CancellationToken::new())
        .unwrap()
        .with_clock(clock.clone());
    CredentialManager::new(Arc::clone(store), Arc::new(refresher), clock)
        .with_policy(RetryPolicy::new(2, Duration::from_millis(10)))
}

fn write_record(store: &FileTokenStore, record: &Value) {
    std::fs::write(store.path(), serde_json::to_string_pretty(record).unwrap()).unwrap();
}

fn read_record(store: &FileTokenStore) -> Value {
    serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap()
}

#[tokio::test]
async fn expired_record_is_refreshed_and_persisted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=R-original"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "A2",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let store = Arc::new(FileTokenStore::new(dir.path().join(".ibkr_token.json")));
    let issued = NOW - 3601;
    write_record(
        &store,
        &json!({
            "access_token": "A1",
            "refresh_token": "R-original",
            "expires_in": 3600,
            "exp": issued + 3600,
            "token_type": "Bearer"
        }),
    );

    let credential = manager(&server, &store).get_valid_credential().await.unwrap();

    assert_eq!(credential.access_token, "A2");
    assert_eq!(credential.refresh_token, "R-original");
    assert_eq!(credential.exp, Some(NOW + 3600));

    let persisted = read_record(&store);
    assert_eq!(persisted["access_token"], "A2");
    assert_eq!(persisted["refresh_token"], "R-original");
    assert_eq!(persisted["exp"], NOW + 3600);
    assert!(!store.temp_path().exists());
}

#[tokio::test]
async fn fresh_record_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let store = Arc::new(FileTokenStore::new(dir.path().join("token.json")));
    let record = json!({
        "access_token": "A1",
        "refresh_token": "R1",
        "expires_in": 3600,
        "exp": NOW + 600
    });
    write_record(&store, &record);
    let before = std::fs::read_to_string(store.path()).unwrap();

    let credential = manager(&server, &store).get_valid_credential().await.unwrap();

    assert_eq!(credential.access_token, "A1");
    assert_eq!(std::fs::read_to_string(store.path()).unwrap(), before);
}

#[tokio::test]
async fn rotated_refresh_token_replaces_the_old_one() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "A2",
            "refresh_token": "R2",
            "expires_in": 1800
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let store = Arc::new(FileTokenStore::new(dir.path().join("token.json")));
    write_record(
        &store,
        &json!({"access_token": "A1", "refresh_token": "R1", "expires_in": 3600, "exp": 0}),
    );

    manager(&server, &store).get_valid_credential().await.unwrap();

    let stored = store.load().unwrap().unwrap();
    assert_eq!(stored.refresh_token, "R2");
    assert_eq!(stored.expires_in, 1800);
}

#[tokio::test]
async fn rejected_refresh_keeps_previous_file() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid_client"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let store = Arc::new(FileTokenStore::new(dir.path().join("token.json")));
    write_record(
        &store,
        &json!({"access_token": "A1", "refresh_token": "R1", "expires_in": 3600, "exp": 0}),
    );
    let before = std::fs::read_to_string(store.path()).unwrap();

    let err = manager(&server, &store).get_valid_credential().await.unwrap_err();

    assert!(matches!(
        err,
        CredentialError::Refresh(RefreshError::Rejected { status: 401, .. })
    ));
    assert_eq!(std::fs::read_to_string(store.path()).unwrap(), before);
}

#[tokio::test]
async fn missing_file_asks_for_bootstrap() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let store = Arc::new(FileTokenStore::new(dir.path().join("token.json")));

    let err = manager(&server, &store).get_valid_credential().await.unwrap_err();

    assert!(err.is_missing_bootstrap());
    assert!(err.to_string().contains("token.json"));
    assert!(server.received_requests().await.unwrap().is_empty());
}
