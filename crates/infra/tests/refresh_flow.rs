//! End-to-end tests for the refresh-and-retry pipeline
//!
//! Exercises the executor, coordinator, and store together against a mock
//! server: single-flight refresh under concurrency, fan-out consistency,
//! the one-retry policy, and the logout broadcast.

use std::sync::Arc;
use std::time::Duration;

use campfire_common::auth::{InMemoryTokenStore, TokenPair, TokenStore};
use campfire_domain::ApiError;
use campfire_infra::api::{ApiClient, ApiClientConfig, ConnectivityGate, Endpoint};
use futures::future::join_all;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, store: Arc<InMemoryTokenStore>) -> ApiClient {
    let config = ApiClientConfig { base_url: server.uri(), ..Default::default() };
    ApiClient::new(config, store, ConnectivityGate::assume_online()).unwrap()
}

fn logged_in_store() -> Arc<InMemoryTokenStore> {
    Arc::new(InMemoryTokenStore::with_tokens(TokenPair::new("old-access", "old-refresh")))
}

async fn refresh_calls(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|request| request.url.path() == "/auth/refresh")
        .count()
}

/// Refresh endpoint that succeeds after a delay, so concurrent callers
/// pile onto the same episode.
async fn mount_slow_successful_refresh(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(150))
                .set_body_json(json!({
                    "success": true,
                    "data": {
                        "accessToken": "new-access",
                        "refreshToken": "new-refresh",
                        "expiresIn": 3600,
                    },
                    "error": null,
                })),
        )
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn five_concurrent_401s_share_one_refresh_and_all_succeed() {
    let server = MockServer::start().await;

    // The stale token is rejected, the refreshed one is accepted.
    Mock::given(method("GET"))
        .and(path("/feed"))
        .and(header("Authorization", "Bearer old-access"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/feed"))
        .and(header("Authorization", "Bearer new-access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"items": []},
        })))
        .mount(&server)
        .await;
    mount_slow_successful_refresh(&server).await;

    let store = logged_in_store();
    let client = Arc::new(client_for(&server, store.clone()));

    let calls = (0..5).map(|_| {
        let client = Arc::clone(&client);
        tokio::spawn(async move {
            let result: Result<serde_json::Value, ApiError> =
                client.send(&Endpoint::get("/feed")).await;
            result
        })
    });

    for outcome in join_all(calls).await {
        assert!(outcome.unwrap().is_ok(), "every caller must succeed after the shared refresh");
    }

    assert_eq!(refresh_calls(&server).await, 1, "exactly one refresh call may hit the network");

    let pair = store.get().await.unwrap();
    assert_eq!(pair.access, "new-access");
    assert_eq!(pair.refresh, "new-refresh");
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_refresh_abandons_all_callers_with_one_logout() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    // The refresh endpoint itself rejects the session; terminal, never
    // re-entered.
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(401).set_delay(Duration::from_millis(150)))
        .mount(&server)
        .await;

    let store = logged_in_store();
    let client = Arc::new(client_for(&server, store.clone()));
    let mut logout_rx = client.subscribe_logout();

    let calls = (0..3).map(|_| {
        let client = Arc::clone(&client);
        tokio::spawn(async move {
            let result: Result<serde_json::Value, ApiError> =
                client.send(&Endpoint::get("/feed")).await;
            result
        })
    });

    for outcome in join_all(calls).await {
        assert_eq!(outcome.unwrap().unwrap_err(), ApiError::Unauthorized);
    }

    assert_eq!(refresh_calls(&server).await, 1);
    assert!(store.get().await.is_none(), "credentials must be cleared");

    assert!(logout_rx.try_recv().is_ok(), "expected exactly one logout event");
    assert!(logout_rx.try_recv().is_err(), "expected no further logout events");
}

#[tokio::test(flavor = "multi_thread")]
async fn a_request_is_never_retried_twice() {
    let server = MockServer::start().await;

    // The endpoint rejects every token, refreshed or not.
    Mock::given(method("GET"))
        .and(path("/members/me"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    mount_slow_successful_refresh(&server).await;

    let store = logged_in_store();
    let client = client_for(&server, store.clone());

    let result: Result<serde_json::Value, ApiError> =
        client.send(&Endpoint::get("/members/me")).await;
    assert_eq!(result.unwrap_err(), ApiError::Unauthorized);

    // One refresh for the first 401; the post-retry 401 surfaces directly
    // instead of starting another cycle.
    assert_eq!(refresh_calls(&server).await, 1);

    let requests = server.received_requests().await.unwrap();
    let endpoint_attempts =
        requests.iter().filter(|request| request.url.path() == "/members/me").count();
    assert_eq!(endpoint_attempts, 2, "original attempt plus exactly one retry");
}

#[tokio::test(flavor = "multi_thread")]
async fn retry_carries_the_refreshed_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rooms"))
        .and(header("Authorization", "Bearer old-access"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rooms"))
        .and(header("Authorization", "Bearer new-access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"rooms": ["lobby"]},
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_slow_successful_refresh(&server).await;

    let client = client_for(&server, logged_in_store());

    let rooms: serde_json::Value = client.send(&Endpoint::get("/rooms")).await.unwrap();
    assert_eq!(rooms, json!({"rooms": ["lobby"]}));
}

#[tokio::test(flavor = "multi_thread")]
async fn sequential_sessions_refresh_independently() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/feed"))
        .and(header("Authorization", "Bearer old-access"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/feed"))
        .and(header("Authorization", "Bearer new-access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"items": []},
        })))
        .mount(&server)
        .await;
    mount_slow_successful_refresh(&server).await;

    let store = logged_in_store();
    let client = client_for(&server, store.clone());

    let first: Result<serde_json::Value, ApiError> = client.send(&Endpoint::get("/feed")).await;
    assert!(first.is_ok());

    // With the refreshed pair installed, later calls proceed without
    // touching the refresh endpoint again.
    let second: Result<serde_json::Value, ApiError> = client.send(&Endpoint::get("/feed")).await;
    assert!(second.is_ok());

    assert_eq!(refresh_calls(&server).await, 1);
}
