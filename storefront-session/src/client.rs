//! HTTP client wrapper for the storefront backend
//!
//! Attaches the access token to every request and recovers from an expired
//! access token by refreshing it once and resending the request. When the
//! refresh fails the session is torn down: both token cookies are cleared and
//! a logout is broadcast on [`SessionEvents`].
//!
//! Refreshes are single-flight. A request that hit 401 while another request
//! was already refreshing reuses the new token instead of calling the refresh
//! endpoint a second time. If that refresh failed and ended the session, the
//! waiting request gives up with its own 401 without refreshing or announcing
//! the logout again.

use crate::cookies::{CookiePolicy, CookieStore};
use crate::events::{LogoutReason, SessionEvents};
use reqwest::header::{HeaderMap, AUTHORIZATION, COOKIE, SET_COOKIE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use storefront_core::{
    ErrorContext, RefreshResponse, StorefrontConfig, StorefrontError, StorefrontResult,
    ACCESS_TOKEN_COOKIE,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub const REFRESH_TOKEN_ENDPOINT: &str = "/auth/refresh-token";

/// One logical API request
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    /// Set once the request has been through a refresh; never refreshed again
    retried: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Send without the refresh-and-retry step; a 401 is returned as is
    pub fn without_refresh(mut self) -> Self {
        self.retried = true;
        self
    }

    pub fn is_retried(&self) -> bool {
        self.retried
    }
}

/// Decoded backend response
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn into_json<T: DeserializeOwned>(self) -> StorefrontResult<T> {
        Ok(serde_json::from_value(self.body)?)
    }
}

/// Client configuration
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL, already including the `/api` suffix
    pub base_url: String,
    pub timeout: Duration,
    pub cookie_policy: CookiePolicy,
}

impl ApiClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(30),
            cookie_policy: CookiePolicy::default(),
        }
    }

    pub fn from_config(config: &StorefrontConfig) -> Self {
        Self {
            base_url: config.backend.api_base(),
            timeout: Duration::from_secs(config.backend.timeout_seconds),
            cookie_policy: CookiePolicy::from_config(config),
        }
    }
}

/// Credentialed HTTP client shared by every API binding
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ApiClientConfig,
    cookies: Arc<dyn CookieStore>,
    events: SessionEvents,
    refresh_lock: Arc<Mutex<()>>,
    /// Bumped every time the session ends
    session_generation: Arc<AtomicU64>,
}

impl ApiClient {
    pub fn new(
        config: ApiClientConfig,
        cookies: Arc<dyn CookieStore>,
        events: SessionEvents,
    ) -> StorefrontResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("storefront/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StorefrontError::Config {
                message: format!("Failed to create HTTP client: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("api_client").with_operation("new"),
            })?;

        info!("Created API client for {}", config.base_url);

        Ok(Self {
            http,
            config,
            cookies,
            events,
            refresh_lock: Arc::new(Mutex::new(())),
            session_generation: Arc::new(AtomicU64::new(0)),
        })
    }

    pub fn cookies(&self) -> &Arc<dyn CookieStore> {
        &self.cookies
    }

    pub fn events(&self) -> &SessionEvents {
        &self.events
    }

    pub fn cookie_policy(&self) -> CookiePolicy {
        self.config.cookie_policy
    }

    /// Store a freshly issued access token
    pub async fn store_access_token(&self, token: &str) {
        let cookie = self.config.cookie_policy.access_token(token);
        self.cookies.set(cookie).await;
    }

    /// Clear both tokens without announcing anything
    pub async fn clear_tokens(&self) {
        self.cookies.clear_tokens().await;
    }

    /// Clear both tokens and broadcast the logout
    pub async fn end_session(&self, reason: LogoutReason) {
        self.session_generation.fetch_add(1, Ordering::SeqCst);
        self.cookies.clear_tokens().await;
        self.events.logout(reason);
    }

    /// Send a request, refreshing the access token once on 401
    pub async fn send(&self, mut request: ApiRequest) -> StorefrontResult<ApiResponse> {
        loop {
            let generation = self.session_generation.load(Ordering::SeqCst);
            let token = self.cookies.get(ACCESS_TOKEN_COOKIE).await;
            let response = self.dispatch(&request, token.as_deref()).await?;

            if response.status() == StatusCode::UNAUTHORIZED && !request.retried {
                request.retried = true;
                let original = Self::error_from(response).await;

                if self
                    .refresh_after(&request.path, token.as_deref(), generation)
                    .await
                    .is_some()
                {
                    debug!(path = %request.path, "Retrying request with refreshed token");
                    continue;
                }
                return Err(original);
            }

            return Self::decode(response).await;
        }
    }

    pub async fn get(&self, path: &str) -> StorefrontResult<Value> {
        Ok(self.send(ApiRequest::get(path)).await?.body)
    }

    pub async fn post(&self, path: &str, body: Value) -> StorefrontResult<Value> {
        Ok(self.send(ApiRequest::post(path).json(body)).await?.body)
    }

    pub async fn put(&self, path: &str, body: Value) -> StorefrontResult<Value> {
        Ok(self.send(ApiRequest::put(path).json(body)).await?.body)
    }

    pub async fn delete(&self, path: &str) -> StorefrontResult<Value> {
        Ok(self.send(ApiRequest::delete(path)).await?.body)
    }

    /// Mint a new access token from the refresh cookie and store it.
    ///
    /// Fails with `SessionExpired` when the backend refuses or answers
    /// without a token. Cookies are left untouched on failure.
    pub async fn refresh_access_token(&self) -> StorefrontResult<String> {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_locked().await
    }

    /// Token to retry with after a 401, or `None` when the session is over.
    ///
    /// Reuses a token another caller stored while we waited for the lock.
    /// Gives up quietly when the session ended after `generation` was read.
    /// A failed refresh ends the session before the lock is released.
    async fn refresh_after(
        &self,
        path: &str,
        stale: Option<&str>,
        generation: u64,
    ) -> Option<String> {
        let _guard = self.refresh_lock.lock().await;

        if self.session_generation.load(Ordering::SeqCst) != generation {
            debug!(path = %path, "Session ended while waiting for refresh");
            return None;
        }

        if let Some(current) = self.cookies.get(ACCESS_TOKEN_COOKIE).await {
            if Some(current.as_str()) != stale {
                debug!("Reusing access token refreshed by a concurrent request");
                return Some(current);
            }
        }

        match self.refresh_locked().await {
            Ok(token) => Some(token),
            Err(e) => {
                warn!(path = %path, error = %e, "Token refresh failed, ending session");
                self.end_session(LogoutReason::RefreshFailed).await;
                None
            }
        }
    }

    async fn refresh_locked(&self) -> StorefrontResult<String> {
        debug!("Attempting to refresh access token");

        let request = ApiRequest::post(REFRESH_TOKEN_ENDPOINT)
            .json(serde_json::json!({}))
            .without_refresh();
        let response = self.dispatch(&request, None).await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            return Err(StorefrontError::SessionExpired {
                message: format!("Refresh endpoint answered {}", status),
                context: ErrorContext::new("api_client")
                    .with_operation("refresh_access_token")
                    .with_metadata("status", &status.to_string())
                    .with_suggestion("Log in again"),
            });
        }

        let body: RefreshResponse = Self::decode(response).await?.into_json().unwrap_or_default();
        let Some(token) = body.access_token.filter(|t| !t.is_empty()) else {
            return Err(StorefrontError::SessionExpired {
                message: "No access token returned from refresh endpoint".to_string(),
                context: ErrorContext::new("api_client")
                    .with_operation("refresh_access_token")
                    .with_suggestion("Log in again"),
            });
        };

        self.store_access_token(&token).await;
        info!("Access token refreshed");
        Ok(token)
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        access_token: Option<&str>,
    ) -> StorefrontResult<reqwest::Response> {
        let url = format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            request.path.trim_start_matches('/')
        );

        let mut builder = self.http.request(request.method.clone(), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(token) = access_token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        if let Some(cookie_header) = self.cookies.header_value().await {
            builder = builder.header(COOKIE, cookie_header);
        }

        debug!(method = %request.method, url = %url, "Sending API request");

        let response = builder.send().await.map_err(|e| StorefrontError::Network {
            message: format!("Request to {} failed: {}", url, e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("api_client")
                .with_operation("dispatch")
                .with_metadata("path", &request.path),
        })?;

        self.capture_cookies(response.headers()).await;
        Ok(response)
    }

    async fn capture_cookies(&self, headers: &HeaderMap) {
        for value in headers.get_all(SET_COOKIE) {
            if let Ok(header) = value.to_str() {
                self.cookies.apply_set_cookie(header).await;
            }
        }
    }

    async fn decode(response: reqwest::Response) -> StorefrontResult<ApiResponse> {
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let status = response.status().as_u16();
        let bytes = response.bytes().await.map_err(|e| StorefrontError::Network {
            message: format!("Failed to read response body: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("api_client").with_operation("decode"),
        })?;

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };

        Ok(ApiResponse { status, body })
    }

    async fn error_from(response: reqwest::Response) -> StorefrontError {
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        let message = body
            .get("error")
            .or_else(|| body.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            });

        StorefrontError::from_status(status.as_u16(), message, "api_client")
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}
