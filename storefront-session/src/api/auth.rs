//! Login, registration, logout and token refresh

use crate::client::{ApiClient, ApiRequest};
use crate::events::LogoutReason;
use storefront_core::{
    AuthResponse, ErrorContext, LoginRequest, RegisterRequest, StorefrontError, StorefrontResult,
};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct AuthApi {
    client: ApiClient,
}

impl AuthApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Log in and store the issued access token
    pub async fn login(&self, credentials: &LoginRequest) -> StorefrontResult<AuthResponse> {
        let body = serde_json::to_value(credentials)?;
        self.authenticate("/auth/login", body).await
    }

    /// Register and store the issued access token
    pub async fn register(&self, details: &RegisterRequest) -> StorefrontResult<AuthResponse> {
        let body = serde_json::to_value(details)?;
        self.authenticate("/auth/register", body).await
    }

    /// Log out on the backend, then always drop local tokens and broadcast
    pub async fn logout(&self) -> StorefrontResult<()> {
        let result = self
            .client
            .send(ApiRequest::post("/auth/logout").without_refresh())
            .await;

        if let Err(e) = &result {
            warn!(error = %e, "Backend logout failed, clearing local session anyway");
        }

        self.client.end_session(LogoutReason::UserRequested).await;
        result.map(|_| ())
    }

    /// Mint a new access token from the refresh cookie
    pub async fn refresh_token(&self) -> StorefrontResult<String> {
        self.client.refresh_access_token().await
    }

    async fn authenticate(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> StorefrontResult<AuthResponse> {
        // Bad credentials come back as 401; that must not trigger a refresh
        let request = ApiRequest::post(path).json(body).without_refresh();
        let response: AuthResponse = self.client.send(request).await?.into_json()?;

        let Some(token) = response.access_token.as_deref().filter(|t| !t.is_empty()) else {
            return Err(StorefrontError::Internal {
                message: "An error occurred. Please try again later.".to_string(),
                source: None,
                context: ErrorContext::new("auth_api")
                    .with_operation(path)
                    .with_metadata("reason", "missing access token"),
            });
        };

        self.client.store_access_token(token).await;
        info!(
            user = response.user.as_ref().map(|u| u.id.as_str()),
            "Authenticated via {}", path
        );
        Ok(response)
    }
}
