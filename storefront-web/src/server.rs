//! Storefront web server
//!
//! Main web server implementation using Axum.

use crate::{create_app, AppState, WebConfig, WebError, WebResult};
use axum::serve;
use storefront_core::StorefrontConfig;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Main storefront web server
pub struct StorefrontServer {
    config: WebConfig,
    state: AppState,
}

impl StorefrontServer {
    /// Create a new server talking to the configured backend
    pub fn new(config: WebConfig) -> WebResult<Self> {
        let state = AppState::new(config.clone())?;
        Ok(Self { config, state })
    }

    /// Start the web server
    pub async fn start(self) -> WebResult<()> {
        let address = self.config.address();

        info!("Starting storefront web server");
        info!("Server address: http://{}", address);
        info!("Backend API: {}", self.config.api_base);
        info!("Development mode: {}", self.config.dev_mode);

        let app = create_app(self.state);

        let listener = TcpListener::bind(&address)
            .await
            .map_err(WebError::Server)?;

        info!("Server listening on http://{}", address);

        if let Err(e) = serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
        {
            error!("Server error: {}", e);
            return Err(WebError::Server(e));
        }

        info!("Server shut down");
        Ok(())
    }

}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}

/// Builder for StorefrontServer
pub struct StorefrontServerBuilder {
    config: WebConfig,
}

impl StorefrontServerBuilder {
    /// Create a new server builder
    pub fn new() -> Self {
        Self {
            config: WebConfig::default(),
        }
    }

    /// Start from a loaded storefront configuration
    pub fn from_config(config: &StorefrontConfig) -> Self {
        Self {
            config: WebConfig::from_config(config),
        }
    }

    /// Set the server host
    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the server port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the backend API base URL (including `/api`)
    pub fn api_base<S: Into<String>>(mut self, api_base: S) -> Self {
        self.config.api_base = api_base.into();
        self
    }

    /// Enable development mode
    pub fn dev_mode(mut self, dev_mode: bool) -> Self {
        self.config.dev_mode = dev_mode;
        self
    }

    /// Build the server
    pub fn build(self) -> WebResult<StorefrontServer> {
        StorefrontServer::new(self.config)
    }
}

impl Default for StorefrontServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
