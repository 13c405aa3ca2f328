//! Server-side calls the edge gate makes to the storefront backend

use crate::{WebConfig, WebError, WebResult};
use async_trait::async_trait;
use cookie::Cookie;
use reqwest::header::{HeaderMap, AUTHORIZATION, COOKIE, SET_COOKIE};
use serde_json::Value;
use storefront_core::{
    ErrorContext, RefreshResponse, StorefrontError, StorefrontResult, UserProfile,
    REFRESH_TOKEN_COOKIE,
};
use storefront_session::api::account::ACCOUNT_ENDPOINT;
use storefront_session::client::REFRESH_TOKEN_ENDPOINT;
use tracing::debug;

/// Outcome of a successful refresh at the edge
#[derive(Debug, Clone)]
pub struct EdgeRefresh {
    pub access_token: String,
    /// Replacement refresh cookie when the backend rotates it
    pub refresh_cookie: Option<Cookie<'static>>,
}

impl EdgeRefresh {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_cookie: None,
        }
    }
}

/// Token and profile lookups needed before a page renders
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Exchange a refresh token for a new access token
    async fn refresh(&self, refresh_token: &str) -> StorefrontResult<EdgeRefresh>;

    /// Profile of the access token's owner
    async fn fetch_profile(&self, access_token: &str) -> StorefrontResult<UserProfile>;
}

/// [`AuthBackend`] over the backend REST API
#[derive(Debug, Clone)]
pub struct HttpAuthBackend {
    http: reqwest::Client,
    api_base: String,
}

impl HttpAuthBackend {
    pub fn new(config: &WebConfig) -> WebResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.backend_timeout)
            .build()
            .map_err(|e| WebError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    /// The rotated `refreshToken` cookie among the response's `Set-Cookie` headers
    fn rotated_refresh_cookie(headers: &HeaderMap) -> Option<Cookie<'static>> {
        headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|header| Cookie::parse(header.to_string()).ok())
            .find(|cookie| cookie.name() == REFRESH_TOKEN_COOKIE)
    }

    fn network_error(operation: &str, e: reqwest::Error) -> StorefrontError {
        StorefrontError::Network {
            message: format!("Backend call failed: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("edge_gate").with_operation(operation),
        }
    }
}

#[async_trait]
impl AuthBackend for HttpAuthBackend {
    async fn refresh(&self, refresh_token: &str) -> StorefrontResult<EdgeRefresh> {
        debug!("Refreshing access token at the edge");

        let response = self
            .http
            .post(self.url(REFRESH_TOKEN_ENDPOINT))
            .header(COOKIE, format!("{}={}", REFRESH_TOKEN_COOKIE, refresh_token))
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| Self::network_error("refresh", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StorefrontError::SessionExpired {
                message: format!("Refresh endpoint answered {}", status.as_u16()),
                context: ErrorContext::new("edge_gate").with_operation("refresh"),
            });
        }

        let refresh_cookie = Self::rotated_refresh_cookie(response.headers());
        let body: RefreshResponse = response.json().await.unwrap_or_default();
        let access_token = body
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| StorefrontError::SessionExpired {
                message: "No access token returned from refresh endpoint".to_string(),
                context: ErrorContext::new("edge_gate").with_operation("refresh"),
            })?;

        if refresh_cookie.is_some() {
            debug!("Backend rotated the refresh cookie");
        }
        Ok(EdgeRefresh {
            access_token,
            refresh_cookie,
        })
    }

    async fn fetch_profile(&self, access_token: &str) -> StorefrontResult<UserProfile> {
        let response = self
            .http
            .get(self.url(ACCOUNT_ENDPOINT))
            .header(AUTHORIZATION, format!("Bearer {}", access_token))
            .send()
            .await
            .map_err(|e| Self::network_error("fetch_profile", e))?;

        let status = response.status();
        if !status.is_success() {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Profile request failed")
                .to_string();
            return Err(StorefrontError::from_status(
                status.as_u16(),
                message,
                "edge_gate",
            ));
        }

        response
            .json()
            .await
            .map_err(|e| Self::network_error("fetch_profile", e))
    }
}
