//! Bindings for the storefront backend REST API
//!
//! Thin wrappers over [`ApiClient`](crate::client::ApiClient): request shape
//! in, JSON body out.

pub mod account;
pub mod auth;
pub mod resources;

pub use account::AccountApi;
pub use auth::AuthApi;
pub use resources::{CartApi, OrdersApi, ProductsApi, Resource, ResourceApi};
