//! Route definitions for the storefront web server

use crate::{handlers, AppState};
use axum::{routing::get, Router};

/// Create page routes
pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::home))
        .route("/health", get(handlers::health_check))
        // Auth pages
        .route("/login", get(handlers::login))
        .route("/register", get(handlers::register))
        .route("/logout", get(handlers::logout))
        // Signed-in pages
        .route("/profile", get(handlers::profile))
        .route("/profile/{*rest}", get(handlers::profile))
        .route("/dashboard", get(handlers::dashboard))
        .route("/dashboard/{*rest}", get(handlers::dashboard))
        .route("/403", get(handlers::forbidden))
}
