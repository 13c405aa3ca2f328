//! Test helpers: an in-process backend that speaks the storefront auth API
//!
//! The backend runs on an ephemeral port and counts every call so tests can
//! assert how many refreshes and retries the session layer performed.

#![allow(dead_code)]

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use storefront_session::{
    ApiClient, ApiClientConfig, CookieStore, MemoryCookieStore, SessionEvents, StoredCookie,
};
use tokio::net::TcpListener;

pub const VALID_EMAIL: &str = "shopper@example.com";

/// How the refresh endpoint answers
#[derive(Debug, Clone)]
pub enum RefreshBehavior {
    /// 200 with a new access token
    Issue(String),
    /// 200 with a token the backend keeps rejecting
    Stale(String),
    /// 200 with an empty body
    NoToken,
    /// 403
    Reject,
}

#[derive(Debug)]
pub struct BackendState {
    pub refresh_calls: AtomicUsize,
    pub account_calls: AtomicUsize,
    pub product_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,
    valid_token: Mutex<String>,
    refresh: Mutex<RefreshBehavior>,
    role: Mutex<u16>,
    refresh_delay: Mutex<Duration>,
}

#[derive(Debug, Clone)]
pub struct MockBackend {
    pub state: Arc<BackendState>,
    pub base_url: String,
}

impl MockBackend {
    pub fn refresh_calls(&self) -> usize {
        self.state.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn account_calls(&self) -> usize {
        self.state.account_calls.load(Ordering::SeqCst)
    }

    pub fn product_calls(&self) -> usize {
        self.state.product_calls.load(Ordering::SeqCst)
    }

    pub fn logout_calls(&self) -> usize {
        self.state.logout_calls.load(Ordering::SeqCst)
    }

    pub fn set_valid_token(&self, token: &str) {
        *self.state.valid_token.lock().unwrap() = token.to_string();
    }

    pub fn set_refresh(&self, behavior: RefreshBehavior) {
        *self.state.refresh.lock().unwrap() = behavior;
    }

    pub fn set_role(&self, role: u16) {
        *self.state.role.lock().unwrap() = role;
    }

    pub fn set_refresh_delay(&self, delay: Duration) {
        *self.state.refresh_delay.lock().unwrap() = delay;
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let expected = format!("Bearer {}", self.state.valid_token.lock().unwrap());
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == expected)
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "jwt expired" })),
    )
        .into_response()
}

async fn refresh(State(backend): State<MockBackend>, headers: HeaderMap) -> Response {
    backend.state.refresh_calls.fetch_add(1, Ordering::SeqCst);

    let delay = *backend.state.refresh_delay.lock().unwrap();
    tokio::time::sleep(delay).await;

    let has_refresh_cookie = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("refreshToken="));
    if !has_refresh_cookie {
        return (StatusCode::FORBIDDEN, Json(json!({ "message": "no refresh token" })))
            .into_response();
    }

    let behavior = backend.state.refresh.lock().unwrap().clone();
    match behavior {
        RefreshBehavior::Issue(token) => {
            backend.set_valid_token(&token);
            Json(json!({ "accessToken": token })).into_response()
        }
        RefreshBehavior::Stale(token) => Json(json!({ "accessToken": token })).into_response(),
        RefreshBehavior::NoToken => Json(json!({})).into_response(),
        RefreshBehavior::Reject => {
            (StatusCode::FORBIDDEN, Json(json!({ "message": "refresh expired" })))
                .into_response()
        }
    }
}

async fn account(State(backend): State<MockBackend>, headers: HeaderMap) -> Response {
    backend.state.account_calls.fetch_add(1, Ordering::SeqCst);
    if !backend.authorized(&headers) {
        return unauthorized();
    }
    let role = *backend.state.role.lock().unwrap();
    Json(json!({
        "_id": "user-1",
        "username": "shopper",
        "email": VALID_EMAIL,
        "role": role,
    }))
    .into_response()
}

async fn products(State(backend): State<MockBackend>, headers: HeaderMap) -> Response {
    backend.state.product_calls.fetch_add(1, Ordering::SeqCst);
    if !backend.authorized(&headers) {
        return unauthorized();
    }
    Json(json!([{ "_id": "p1", "name": "Teapot" }])).into_response()
}

async fn login(State(backend): State<MockBackend>, Json(body): Json<Value>) -> Response {
    if body["email"] != VALID_EMAIL {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Invalid credentials" })),
        )
            .into_response();
    }

    let token = backend.state.valid_token.lock().unwrap().clone();
    let role = *backend.state.role.lock().unwrap();
    (
        [(
            header::SET_COOKIE,
            "refreshToken=refresh-1; Path=/; HttpOnly; Max-Age=604800",
        )],
        Json(json!({
            "accessToken": token,
            "user": { "_id": "user-1", "username": "shopper", "role": role },
        })),
    )
        .into_response()
}

async fn logout(State(backend): State<MockBackend>) -> Response {
    backend.state.logout_calls.fetch_add(1, Ordering::SeqCst);
    (
        [(header::SET_COOKIE, "refreshToken=; Path=/; Max-Age=0")],
        Json(json!({ "message": "logged out" })),
    )
        .into_response()
}

async fn broken() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "message": "database down" })),
    )
        .into_response()
}

/// Start a backend that accepts `valid_token` and refreshes to `fresh-token`
pub async fn spawn_backend(valid_token: &str) -> MockBackend {
    let backend = MockBackend {
        state: Arc::new(BackendState {
            refresh_calls: AtomicUsize::new(0),
            account_calls: AtomicUsize::new(0),
            product_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
            valid_token: Mutex::new(valid_token.to_string()),
            refresh: Mutex::new(RefreshBehavior::Issue("fresh-token".to_string())),
            role: Mutex::new(2004),
            refresh_delay: Mutex::new(Duration::ZERO),
        }),
        base_url: String::new(),
    };

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let address = listener.local_addr().unwrap();

    let app = Router::new()
        .route("/api/auth/refresh-token", post(refresh))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/account", get(account))
        .route("/api/products", get(products))
        .route("/api/broken", get(broken))
        .with_state(backend.clone());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockBackend {
        base_url: format!("http://{}/api", address),
        ..backend
    }
}

/// Client over a fresh jar holding the given cookies
pub fn client_for(
    backend: &MockBackend,
    cookies: &[(&str, &str)],
) -> (ApiClient, MemoryCookieStore, SessionEvents) {
    let store = MemoryCookieStore::with_cookies(
        cookies
            .iter()
            .map(|(name, value)| StoredCookie::session(name, value)),
    );
    let events = SessionEvents::new();
    let client = ApiClient::new(
        ApiClientConfig::new(backend.base_url.clone()),
        Arc::new(store.clone()) as Arc<dyn CookieStore>,
        events.clone(),
    )
    .expect("Failed to build client");
    (client, store, events)
}
