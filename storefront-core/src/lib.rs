//! Storefront Core - shared data structures for the storefront session layer
//!
//! Error taxonomy, configuration, logging and the domain types (roles,
//! profiles, cookie names, well-known paths) used by every other crate.

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use error::*;
pub use logging::*;
pub use types::*;

// Re-export commonly used external types
pub use tracing;
