//! Unified error handling system
//!
//! Structured error types with context, recovery suggestions and the session
//! error taxonomy: recoverable token expiry, unrecoverable refresh failure,
//! plain backend failure and role-based denial.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

pub type StorefrontResult<T> = Result<T, StorefrontError>;

/// Error context providing additional information for debugging and recovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Timestamp when error occurred
    pub timestamp: DateTime<Utc>,
    /// Component where error originated
    pub component: String,
    /// Operation being performed when error occurred
    pub operation: Option<String>,
    /// Additional metadata
    pub metadata: std::collections::HashMap<String, String>,
    /// Recovery suggestions
    pub recovery_suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
            metadata: std::collections::HashMap::new(),
            recovery_suggestions: Vec::new(),
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.recovery_suggestions.push(suggestion.to_string());
        self
    }
}

/// Main error type for the storefront session layer
#[derive(Error, Debug)]
pub enum StorefrontError {
    /// Access token missing or expired. A refresh may recover the session.
    #[error("Unauthorized: {message}")]
    Unauthorized {
        message: String,
        context: ErrorContext,
    },

    /// Refresh token missing, expired or rejected. The session is gone.
    #[error("Session expired: {message}")]
    SessionExpired {
        message: String,
        context: ErrorContext,
    },

    /// Authenticated, but the role may not access the resource.
    #[error("Forbidden: {resource}")]
    Forbidden {
        resource: String,
        context: ErrorContext,
    },

    /// Backend answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        message: String,
        context: ErrorContext,
    },

    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
        context: ErrorContext,
    },

    #[error("Resource not found: {resource}")]
    NotFound {
        resource: String,
        context: ErrorContext,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },
}

impl StorefrontError {
    /// Build an error from a backend status code and message.
    ///
    /// 401 maps to `Unauthorized`, 403 to `Forbidden` and 404 to `NotFound`;
    /// everything else stays a plain `Api` error.
    pub fn from_status(status: u16, message: impl Into<String>, component: &str) -> Self {
        let message = message.into();
        let context = ErrorContext::new(component).with_metadata("status", &status.to_string());
        match status {
            401 => StorefrontError::Unauthorized { message, context },
            403 => StorefrontError::Forbidden {
                resource: message,
                context,
            },
            404 => StorefrontError::NotFound {
                resource: message,
                context,
            },
            _ => StorefrontError::Api {
                status,
                message,
                context,
            },
        }
    }

    /// Get the error context
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            StorefrontError::Unauthorized { context, .. } => Some(context),
            StorefrontError::SessionExpired { context, .. } => Some(context),
            StorefrontError::Forbidden { context, .. } => Some(context),
            StorefrontError::Api { context, .. } => Some(context),
            StorefrontError::Network { context, .. } => Some(context),
            StorefrontError::Config { context, .. } => Some(context),
            StorefrontError::Validation { context, .. } => Some(context),
            StorefrontError::NotFound { context, .. } => Some(context),
            StorefrontError::Internal { context, .. } => Some(context),
            StorefrontError::Io(_) | StorefrontError::Serialization(_) => None,
        }
    }

    /// HTTP status carried by the error, when there is one
    pub fn status(&self) -> Option<u16> {
        match self {
            StorefrontError::Unauthorized { .. } => Some(401),
            StorefrontError::Forbidden { .. } => Some(403),
            StorefrontError::NotFound { .. } => Some(404),
            StorefrontError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the error means the access token was rejected
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, StorefrontError::Unauthorized { .. })
    }

    /// Check if error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            StorefrontError::Unauthorized { .. } => true,
            StorefrontError::Network { .. } => true,
            StorefrontError::Api { status, .. } => *status >= 500,
            StorefrontError::SessionExpired { .. } => false,
            StorefrontError::Forbidden { .. } => false,
            StorefrontError::Config { .. } => false,
            StorefrontError::Validation { .. } => false,
            _ => false,
        }
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        let error_id = self.context().map(|c| c.error_id.clone());
        match self {
            StorefrontError::Internal { .. } => {
                error!(error_id = ?error_id, error = %self, "Internal error occurred");
            }
            StorefrontError::Config { .. } | StorefrontError::Validation { .. } => {
                error!(error_id = ?error_id, error = %self, "Configuration or validation error");
            }
            StorefrontError::Unauthorized { .. }
            | StorefrontError::SessionExpired { .. }
            | StorefrontError::Forbidden { .. } => {
                warn!(error_id = ?error_id, error = %self, "Session error");
            }
            StorefrontError::Network { .. } => {
                warn!(error_id = ?error_id, error = %self, "Network error (may be recoverable)");
            }
            _ => {
                error!(error_id = ?error_id, error = %self, "Error occurred");
            }
        }
    }
}

#[macro_export]
macro_rules! config_error {
    ($msg:expr, $component:expr) => {
        $crate::StorefrontError::Config {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check your configuration file")
                .with_suggestion("Run 'storefront config --init' to create default config"),
        }
    };
}

#[macro_export]
macro_rules! validation_error {
    ($msg:expr, $field:expr, $component:expr) => {
        $crate::StorefrontError::Validation {
            message: $msg.to_string(),
            field: Some($field.to_string()),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check the field value and format"),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_maps_auth_statuses() {
        assert!(StorefrontError::from_status(401, "expired", "test").is_unauthorized());
        assert!(matches!(
            StorefrontError::from_status(403, "/dashboard/users", "test"),
            StorefrontError::Forbidden { .. }
        ));
        assert!(matches!(
            StorefrontError::from_status(404, "/products/1", "test"),
            StorefrontError::NotFound { .. }
        ));

        let err = StorefrontError::from_status(500, "boom", "test");
        assert_eq!(err.status(), Some(500));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_session_expired_is_not_recoverable() {
        let err = StorefrontError::SessionExpired {
            message: "refresh rejected".to_string(),
            context: ErrorContext::new("test"),
        };
        assert!(!err.is_recoverable());
        assert!(!err.is_unauthorized());
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_error_context_builder() {
        let context = ErrorContext::new("client")
            .with_operation("refresh")
            .with_metadata("status", "401")
            .with_suggestion("Log in again");

        assert_eq!(context.component, "client");
        assert_eq!(context.operation.as_deref(), Some("refresh"));
        assert_eq!(context.metadata.get("status").map(String::as_str), Some("401"));
        assert_eq!(context.recovery_suggestions.len(), 1);
    }
}
