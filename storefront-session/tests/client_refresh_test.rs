//! Refresh-and-retry behaviour of the API client

mod helpers;

use helpers::{client_for, spawn_backend, RefreshBehavior};
use std::time::Duration;
use storefront_core::{StorefrontError, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use storefront_session::{ApiRequest, CookieStore, LogoutReason, SessionEvent};
use tokio::sync::broadcast::error::TryRecvError;

#[tokio::test]
async fn valid_token_needs_no_refresh() {
    let backend = spawn_backend("good-token").await;
    let (client, _, _) = client_for(
        &backend,
        &[(ACCESS_TOKEN_COOKIE, "good-token"), (REFRESH_TOKEN_COOKIE, "r")],
    );

    let products = client.get("/products").await.unwrap();

    assert_eq!(products[0]["name"], "Teapot");
    assert_eq!(backend.product_calls(), 1);
    assert_eq!(backend.refresh_calls(), 0);
}

#[tokio::test]
async fn single_401_refreshes_once_and_retries_once() {
    let backend = spawn_backend("good-token").await;
    let (client, store, _) = client_for(
        &backend,
        &[(ACCESS_TOKEN_COOKIE, "stale-token"), (REFRESH_TOKEN_COOKIE, "r")],
    );

    let products = client.get("/products").await.unwrap();

    assert!(products.is_array());
    assert_eq!(backend.refresh_calls(), 1);
    assert_eq!(backend.product_calls(), 2);
    assert_eq!(
        store.get(ACCESS_TOKEN_COOKIE).await.as_deref(),
        Some("fresh-token")
    );
}

#[tokio::test]
async fn missing_access_token_is_refreshed_on_first_401() {
    let backend = spawn_backend("good-token").await;
    let (client, store, _) = client_for(&backend, &[(REFRESH_TOKEN_COOKIE, "r")]);

    client.get("/products").await.unwrap();

    assert_eq!(backend.refresh_calls(), 1);
    assert_eq!(
        store.get(ACCESS_TOKEN_COOKIE).await.as_deref(),
        Some("fresh-token")
    );
}

#[tokio::test]
async fn retried_401_is_returned_without_second_refresh() {
    let backend = spawn_backend("good-token").await;
    backend.set_refresh(RefreshBehavior::Stale("also-stale".to_string()));
    let (client, store, events) = client_for(
        &backend,
        &[(ACCESS_TOKEN_COOKIE, "stale-token"), (REFRESH_TOKEN_COOKIE, "r")],
    );
    let mut logout = events.subscribe();

    let err = client.get("/products").await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(backend.refresh_calls(), 1);
    assert_eq!(backend.product_calls(), 2);
    // The refresh itself succeeded, so the session stays
    assert!(matches!(logout.try_recv(), Err(TryRecvError::Empty)));
    assert_eq!(store.get(REFRESH_TOKEN_COOKIE).await.as_deref(), Some("r"));
}

#[tokio::test]
async fn refresh_without_token_ends_session() {
    let backend = spawn_backend("good-token").await;
    backend.set_refresh(RefreshBehavior::NoToken);
    let (client, store, events) = client_for(
        &backend,
        &[(ACCESS_TOKEN_COOKIE, "stale-token"), (REFRESH_TOKEN_COOKIE, "r")],
    );
    let mut logout = events.subscribe();

    let err = client.get("/products").await.unwrap_err();

    // The caller sees the original 401, not the refresh failure
    match &err {
        StorefrontError::Unauthorized { message, .. } => assert_eq!(message, "jwt expired"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(backend.product_calls(), 1);
    assert_eq!(store.get(ACCESS_TOKEN_COOKIE).await, None);
    assert_eq!(store.get(REFRESH_TOKEN_COOKIE).await, None);
    assert_eq!(
        logout.try_recv().unwrap(),
        SessionEvent::LoggedOut {
            reason: LogoutReason::RefreshFailed
        }
    );
    assert!(matches!(logout.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn rejected_refresh_ends_session() {
    let backend = spawn_backend("good-token").await;
    backend.set_refresh(RefreshBehavior::Reject);
    let (client, store, events) = client_for(
        &backend,
        &[(ACCESS_TOKEN_COOKIE, "stale-token"), (REFRESH_TOKEN_COOKIE, "r")],
    );
    let mut logout = events.subscribe();

    assert!(client.get("/products").await.unwrap_err().is_unauthorized());
    assert!(store.snapshot().await.is_empty());
    assert!(logout.try_recv().is_ok());
}

#[tokio::test]
async fn concurrent_401s_share_one_refresh() {
    let backend = spawn_backend("good-token").await;
    backend.set_refresh_delay(Duration::from_millis(100));
    let (client, store, _) = client_for(
        &backend,
        &[(ACCESS_TOKEN_COOKIE, "stale-token"), (REFRESH_TOKEN_COOKIE, "r")],
    );

    let results = futures::future::join_all((0..4).map(|_| {
        let client = client.clone();
        async move { client.get("/products").await }
    }))
    .await;

    assert!(results.iter().all(Result::is_ok));
    assert_eq!(backend.refresh_calls(), 1);
    assert_eq!(
        store.get(ACCESS_TOKEN_COOKIE).await.as_deref(),
        Some("fresh-token")
    );
}

#[tokio::test]
async fn concurrent_401s_share_one_failed_refresh() {
    let backend = spawn_backend("good-token").await;
    backend.set_refresh(RefreshBehavior::Reject);
    backend.set_refresh_delay(Duration::from_millis(100));
    let (client, store, events) = client_for(
        &backend,
        &[(ACCESS_TOKEN_COOKIE, "stale-token"), (REFRESH_TOKEN_COOKIE, "r")],
    );
    let mut logout = events.subscribe();

    let results = futures::future::join_all((0..4).map(|_| {
        let client = client.clone();
        async move { client.get("/products").await }
    }))
    .await;

    assert!(results
        .iter()
        .all(|r| r.as_ref().is_err_and(StorefrontError::is_unauthorized)));
    assert_eq!(backend.refresh_calls(), 1);
    assert!(store.snapshot().await.is_empty());
    assert_eq!(
        logout.try_recv().unwrap(),
        SessionEvent::LoggedOut {
            reason: LogoutReason::RefreshFailed
        }
    );
    assert!(matches!(logout.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn opted_out_request_skips_refresh() {
    let backend = spawn_backend("good-token").await;
    let (client, store, _) = client_for(
        &backend,
        &[(ACCESS_TOKEN_COOKIE, "stale-token"), (REFRESH_TOKEN_COOKIE, "r")],
    );

    let err = client
        .send(ApiRequest::get("/products").without_refresh())
        .await
        .unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(backend.refresh_calls(), 0);
    assert!(store.get(REFRESH_TOKEN_COOKIE).await.is_some());
}

#[tokio::test]
async fn server_errors_pass_through() {
    let backend = spawn_backend("good-token").await;
    let (client, _, _) = client_for(&backend, &[(ACCESS_TOKEN_COOKIE, "good-token")]);

    let err = client.get("/broken").await.unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert!(err.to_string().contains("database down"));
    assert!(err.is_recoverable());
    assert_eq!(backend.refresh_calls(), 0);
}

#[tokio::test]
async fn unreachable_backend_is_network_error() {
    let backend = spawn_backend("good-token").await;
    let mut unreachable = backend.clone();
    unreachable.base_url = "http://127.0.0.1:9/api".to_string();
    let (client, _, _) = client_for(&unreachable, &[]);

    let err = client.get("/products").await.unwrap_err();

    assert!(matches!(err, StorefrontError::Network { .. }));
}
