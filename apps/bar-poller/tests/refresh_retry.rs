//! Token Refresh Retry Integration Tests
//!
//! Drives `HttpTokenRefresher` against a mock token endpoint and checks how
//! failures are classified and retried.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::{Duration, Instant};

use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bar_poller::{
    HttpTokenRefresher, OAuthClientConfig, RefreshError, RetryPolicy, TokenRefresherPort,
};

fn fast_policy() -> RetryPolicy {
    RetryPolicy::new(2, Duration::from_millis(10))
}

fn refresher(server: &MockServer, shutdown: CancellationToken) -> HttpTokenRefresher {
    let config = OAuthClientConfig::new(format!("{}/token", server.uri()), "client-1", "secret-1");
    HttpTokenRefresher::new(config, shutdown).unwrap()
}

fn token_reply() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "access_token": "A2",
        "token_type": "Bearer",
        "expires_in": 3600
    }))
}

#[tokio::test]
async fn sends_form_encoded_refresh_grant() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=R1"))
        .and(body_string_contains("client_id=client-1"))
        .and(body_string_contains("client_secret=secret-1"))
        .respond_with(token_reply())
        .expect(1)
        .mount(&server)
        .await;

    let grant = refresher(&server, CancellationToken::new())
        .refresh("R1", &fast_policy())
        .await
        .unwrap();

    assert_eq!(grant.response.access_token, "A2");
    assert_eq!(grant.response.expires_in, 3600);
    assert_eq!(grant.response.refresh_token, None);
}

#[tokio::test]
async fn recovers_from_transient_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .up_to_n_times(2)
        .with_priority(1)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(token_reply())
        .expect(1)
        .mount(&server)
        .await;

    let grant = refresher(&server, CancellationToken::new())
        .refresh("R1", &fast_policy())
        .await
        .unwrap();

    assert_eq!(grant.response.access_token, "A2");
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn client_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_string("{\"error\":\"invalid_grant\"}"))
        .expect(1)
        .mount(&server)
        .await;

    let err = refresher(&server, CancellationToken::new())
        .refresh("revoked", &RetryPolicy::new(5, Duration::from_millis(10)))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        RefreshError::Rejected {
            status: 400,
            body: "{\"error\":\"invalid_grant\"}".to_string(),
        }
    );
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn persistent_server_error_exhausts_retries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(3)
        .mount(&server)
        .await;

    let err = refresher(&server, CancellationToken::new())
        .refresh("R1", &fast_policy())
        .await
        .unwrap_err();

    match &err {
        RefreshError::Exhausted { attempts, last } => {
            assert_eq!(*attempts, 3);
            assert!(last.contains("500"), "last error was {last}");
        }
        other => panic!("expected Exhausted, got {other:?}"),
    }
    assert!(err.to_string().contains("boom"));
}

#[tokio::test]
async fn malformed_success_body_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"expires_in": 3600})))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(token_reply())
        .mount(&server)
        .await;

    let grant = refresher(&server, CancellationToken::new())
        .refresh("R1", &fast_policy())
        .await
        .unwrap();

    assert_eq!(grant.response.access_token, "A2");
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn shutdown_during_backoff_cancels_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let shutdown = CancellationToken::new();
    let canceller = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        canceller.cancel();
    });

    let started = Instant::now();
    let err = refresher(&server, shutdown)
        .refresh("R1", &RetryPolicy::new(2, Duration::from_secs(60)))
        .await
        .unwrap_err();

    assert_eq!(err, RefreshError::Cancelled);
    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}
