//! Application state shared by the gate and the page handlers

use crate::backend::{AuthBackend, HttpAuthBackend};
use crate::{WebConfig, WebResult};
use std::sync::Arc;
use storefront_session::RouteAccessTable;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    /// Configuration
    pub config: WebConfig,
    /// Dashboard route sensitivity table
    pub routes: Arc<RouteAccessTable>,
    /// Token refresh and profile lookups
    pub backend: Arc<dyn AuthBackend>,
}

impl AppState {
    /// State backed by the real storefront API
    pub fn new(config: WebConfig) -> WebResult<Self> {
        let backend = HttpAuthBackend::new(&config)?;
        info!("Edge gate talks to {}", config.api_base);
        Ok(Self::with_backend(config, Arc::new(backend)))
    }

    pub fn with_backend(config: WebConfig, backend: Arc<dyn AuthBackend>) -> Self {
        Self {
            config,
            routes: Arc::new(RouteAccessTable::default()),
            backend,
        }
    }
}
