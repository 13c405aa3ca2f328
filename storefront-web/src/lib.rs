//! Storefront Web Server
//!
//! Serves the storefront and dashboard pages behind the edge session gate.
//! The gate runs before any page handler: it redirects signed-in users away
//! from the auth pages, refreshes missing access tokens for protected pages
//! and checks the caller's role against the route table for the dashboard.

pub mod backend;
pub mod gate;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;
pub mod templates;

// Re-export main types
pub use backend::{AuthBackend, EdgeRefresh, HttpAuthBackend};
pub use gate::{edge_gate, GateSession, PathGroup};
pub use server::StorefrontServer;
pub use state::AppState;

use axum::{
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    Router,
};
use std::time::Duration;
use storefront_core::{LoggingConfig, StorefrontConfig, StorefrontError};
use storefront_session::CookiePolicy;
use tower_http::trace::TraceLayer;
use tracing::error;

/// Create the main application router
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(routes::page_routes())
        .fallback(handlers::not_found)
        .layer(middleware::from_fn_with_state(state.clone(), gate::edge_gate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Configuration for the web server
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Enable development mode
    pub dev_mode: bool,
    /// Site name shown in page titles
    pub site_name: String,
    /// Backend API base, including the `/api` suffix
    pub api_base: String,
    /// Timeout for backend calls made by the gate
    pub backend_timeout: Duration,
    /// Attributes of the access token cookie written after a refresh
    pub cookie_policy: CookiePolicy,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self::from_config(&StorefrontConfig::default())
    }
}

impl WebConfig {
    pub fn from_config(config: &StorefrontConfig) -> Self {
        Self {
            host: config.server.host.clone(),
            port: config.server.port,
            dev_mode: !config.is_production(),
            site_name: config.site_name.clone(),
            api_base: config.backend.api_base(),
            backend_timeout: Duration::from_secs(config.backend.timeout_seconds),
            cookie_policy: CookiePolicy::from_config(config),
        }
    }

    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Error types for the web server
#[derive(thiserror::Error, Debug)]
pub enum WebError {
    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error("{0}")]
    Storefront(#[from] StorefrontError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for web operations
pub type WebResult<T> = Result<T, WebError>;

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        error!("Request failed: {}", self);
        let status = match &self {
            WebError::Storefront(e) => e
                .status()
                .and_then(|s| StatusCode::from_u16(s).ok())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, "Something went wrong. Please try again later.").into_response()
    }
}

/// Initialize logging for the web server
pub fn init_logging(config: &LoggingConfig) -> WebResult<()> {
    let mut config = config.clone();
    config
        .filter_directives
        .push("tower_http=debug".to_string());
    storefront_core::init_logging(&config)
        .map_err(|e| WebError::Config(format!("Failed to initialize logging: {}", e)))
}
