//! Configuration management

use crate::error::{ErrorContext, StorefrontError, StorefrontResult};
use crate::logging::LoggingConfig;
use crate::{config_error, validation_error};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Deployment environment. Production turns on `Secure` cookies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(format!("Unknown environment: {}", s)),
        }
    }
}

/// Backend the storefront talks to
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Backend origin, without the `/api` suffix
    pub api_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:5000".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl BackendConfig {
    /// Base URL every API path is joined to
    pub fn api_base(&self) -> String {
        format!("{}/api", self.api_url.trim_end_matches('/'))
    }
}

/// Cookie attributes for the access token we write
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub access_token_ttl_minutes: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            access_token_ttl_minutes: crate::types::ACCESS_TOKEN_TTL_MINUTES,
        }
    }
}

/// Web server binding
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Top level configuration shared by the web server and the CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorefrontConfig {
    /// Public site name, presentational only
    pub site_name: String,
    pub environment: Environment,
    pub backend: BackendConfig,
    pub session: SessionConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            site_name: "Storefront".to_string(),
            environment: Environment::Development,
            backend: BackendConfig::default(),
            session: SessionConfig::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> StorefrontResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| StorefrontError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        toml::from_str(&content).map_err(|e| StorefrontError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> StorefrontResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| StorefrontError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        std::fs::write(path, content).map_err(|e| StorefrontError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })
    }

    /// Overlay `STOREFRONT_*` environment variables
    pub fn with_env(self) -> Self {
        self.with_vars(|key| std::env::var(key).ok())
    }

    /// Overlay values from an arbitrary variable source
    pub fn with_vars<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("STOREFRONT_API_URL") {
            self.backend.api_url = url;
        }
        if let Some(name) = lookup("STOREFRONT_SITE_NAME") {
            self.site_name = name;
        }
        if let Some(env) = lookup("STOREFRONT_ENV").and_then(|v| v.parse().ok()) {
            self.environment = env;
        }
        if let Some(host) = lookup("STOREFRONT_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("STOREFRONT_PORT").and_then(|v| v.parse().ok()) {
            self.server.port = port;
        }
        self
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Validate configuration
    pub fn validate(&self) -> StorefrontResult<()> {
        if self.backend.api_url.is_empty() {
            return Err(config_error!("backend.api_url must not be empty", "config"));
        }

        if url::Url::parse(&self.backend.api_url).is_err() {
            return Err(validation_error!(
                format!("Invalid backend URL: {}", self.backend.api_url),
                "backend.api_url",
                "config"
            ));
        }

        if self.session.access_token_ttl_minutes <= 0 {
            return Err(validation_error!(
                "Access token TTL must be positive",
                "session.access_token_ttl_minutes",
                "config"
            ));
        }

        if self.backend.timeout_seconds == 0 {
            return Err(config_error!(
                "backend.timeout_seconds must be greater than 0",
                "config"
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let config = StorefrontConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.is_production());
        assert_eq!(config.backend.api_base(), "http://localhost:5000/api");
    }

    #[test]
    fn test_env_overlay() {
        let vars: HashMap<&str, &str> = [
            ("STOREFRONT_API_URL", "https://shop.example.com/"),
            ("STOREFRONT_ENV", "production"),
            ("STOREFRONT_PORT", "8081"),
            ("STOREFRONT_SITE_NAME", "Bazaar"),
        ]
        .into_iter()
        .collect();

        let config =
            StorefrontConfig::default().with_vars(|key| vars.get(key).map(|v| v.to_string()));

        assert!(config.is_production());
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.site_name, "Bazaar");
        assert_eq!(config.backend.api_base(), "https://shop.example.com/api");
    }

    #[test]
    fn test_invalid_url_rejected() {
        let mut config = StorefrontConfig::default();
        config.backend.api_url = "not a url".to_string();
        assert!(matches!(
            config.validate(),
            Err(StorefrontError::Validation { .. })
        ));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storefront.toml");

        let mut config = StorefrontConfig::default();
        config.site_name = "Corner Shop".to_string();
        config.save_to_file(&path).unwrap();

        let loaded = StorefrontConfig::from_file(&path).unwrap();
        assert_eq!(loaded.site_name, "Corner Shop");
        assert_eq!(loaded.server.port, 3000);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: StorefrontConfig = toml::from_str("site_name = \"Tiny\"").unwrap();
        assert_eq!(config.site_name, "Tiny");
        assert_eq!(config.backend.api_url, "http://localhost:5000");
    }
}
