//! Storefront Session - session management for the storefront
//!
//! - [`client`]: credentialed HTTP client with single refresh-and-retry
//! - [`provider`]: client-side session state machine
//! - [`access`]: route sensitivity table, page guard and role-filtered menus
//! - [`api`]: backend REST bindings
//! - [`cookies`] / [`events`]: token jar and logout broadcast

pub mod access;
pub mod api;
pub mod client;
pub mod cookies;
pub mod events;
pub mod provider;

pub use access::{
    account_menu, sidebar_links, signed_in_menu, GuardVerdict, NavLink, PageGuard, RouteAccess,
    RouteAccessTable, RouteRule,
};
pub use client::{ApiClient, ApiClientConfig, ApiRequest, ApiResponse};
pub use cookies::{CookiePolicy, CookieStore, MemoryCookieStore, StoredCookie};
pub use events::{LogoutReason, SessionEvent, SessionEvents};
pub use provider::{MemoryNavigator, Navigator, SessionProvider, SessionState};

use std::sync::Arc;
use storefront_core::{StorefrontConfig, StorefrontResult};

/// Everything a client application needs, wired together
#[derive(Clone)]
pub struct SessionContext {
    pub client: ApiClient,
    pub auth: api::AuthApi,
    pub account: api::AccountApi,
}

impl SessionContext {
    pub fn new(config: &StorefrontConfig, cookies: Arc<dyn CookieStore>) -> StorefrontResult<Self> {
        let client = ApiClient::new(
            ApiClientConfig::from_config(config),
            cookies,
            SessionEvents::new(),
        )?;
        Ok(Self::from_client(client))
    }

    pub fn from_client(client: ApiClient) -> Self {
        Self {
            auth: api::AuthApi::new(client.clone()),
            account: api::AccountApi::new(client.clone()),
            client,
        }
    }

    /// Session provider bound to this context's client
    pub fn provider(&self, navigator: Arc<dyn Navigator>) -> SessionProvider {
        SessionProvider::new(self.client.clone(), navigator)
    }

    pub fn resource(&self, resource: api::Resource) -> api::ResourceApi {
        api::ResourceApi::new(self.client.clone(), resource)
    }
}
