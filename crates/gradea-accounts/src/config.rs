//! Configuration for the account backend.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Service configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Identity provider configuration
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Document store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Which identity provider to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityBackend {
    #[default]
    Memory,
    Firebase,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    #[serde(default)]
    pub backend: IdentityBackend,

    /// Web API key (firebase backend only)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Identity toolkit base URL
    #[serde(default = "default_identity_url")]
    pub base_url: String,

    /// Failed sign-ins before lockout (memory backend only)
    #[serde(default = "default_max_failed_attempts")]
    pub max_failed_attempts: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path to the JSON snapshot file
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,

    /// Load the snapshot at startup and write it at shutdown
    #[serde(default)]
    pub persist: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Global requests per minute
    #[serde(default = "default_global_rpm")]
    pub global_per_minute: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON log lines
    #[serde(default)]
    pub json: bool,
}

// Default implementations
impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_port(),
        }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            backend: IdentityBackend::default(),
            api_key: None,
            base_url: default_identity_url(),
            max_failed_attempts: default_max_failed_attempts(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
            persist: false,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            global_per_minute: default_global_rpm(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value functions
fn default_listen_addr() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    8080
}

fn default_identity_url() -> String {
    identity_client::DEFAULT_BASE_URL.into()
}

fn default_max_failed_attempts() -> u32 {
    identity_client::DEFAULT_MAX_FAILED_ATTEMPTS
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("/data/gradea-store.json")
}

fn default_global_rpm() -> u32 {
    120
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Sections are separated by `__`, e.g. `IDENTITY__BACKEND=firebase`.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_input() {
        let config: Config = serde_json::from_str("{}").unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.identity.backend, IdentityBackend::Memory);
        assert!(config.identity.api_key.is_none());
        assert!(!config.store.persist);
        assert_eq!(config.rate_limit.global_per_minute, 120);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_partial_sections() {
        let config: Config = serde_json::from_str(
            r#"{"identity": {"backend": "firebase", "api_key": "k"}, "store": {"persist": true}}"#,
        )
        .unwrap();

        assert_eq!(config.identity.backend, IdentityBackend::Firebase);
        assert_eq!(config.identity.api_key.as_deref(), Some("k"));
        assert_eq!(config.identity.base_url, identity_client::DEFAULT_BASE_URL);
        assert!(config.store.persist);
        assert_eq!(config.server.listen_addr, "0.0.0.0");
    }
}
