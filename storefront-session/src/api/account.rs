//! The signed-in user's own account

use crate::client::{ApiClient, ApiRequest};
use serde_json::Value;
use storefront_core::{StorefrontResult, UserProfile};

pub const ACCOUNT_ENDPOINT: &str = "/account";

#[derive(Debug, Clone)]
pub struct AccountApi {
    client: ApiClient,
}

impl AccountApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Fetch the profile, refreshing the access token on 401
    pub async fn profile(&self) -> StorefrontResult<UserProfile> {
        self.client
            .send(ApiRequest::get(ACCOUNT_ENDPOINT))
            .await?
            .into_json()
    }

    /// Fetch the profile with exactly one request; 401 surfaces as `Unauthorized`
    pub async fn profile_once(&self) -> StorefrontResult<UserProfile> {
        self.client
            .send(ApiRequest::get(ACCOUNT_ENDPOINT).without_refresh())
            .await?
            .into_json()
    }

    pub async fn update(&self, changes: Value) -> StorefrontResult<Value> {
        self.client.put(ACCOUNT_ENDPOINT, changes).await
    }

    pub async fn delete(&self) -> StorefrontResult<Value> {
        self.client.delete(ACCOUNT_ENDPOINT).await
    }
}
