//! Configuration resolution for CaseBridge.
//!
//! Resolution order:
//! 1. Built-in defaults
//! 2. Config file (`--config` or `CASEBRIDGE_CONFIG`)
//! 3. CLI arguments (highest priority, applied by the binary)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Complete CaseBridge configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub bus: BusSettings,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub secrets: SecretNames,
}

/// Webhook ingress server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub addr: String,
    pub database_path: Option<PathBuf>,
    pub log_json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8080".to_string(),
            database_path: None,
            log_json: false,
        }
    }
}

/// Event bus redelivery tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusSettings {
    /// Invocation attempts per event before dead-lettering.
    pub max_attempts: u32,
    /// First redelivery delay; doubles per attempt.
    pub base_backoff_ms: u64,
    /// Bounded queue depth per subscription.
    pub queue_capacity: usize,
}

impl Default for BusSettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff_ms: 500,
            queue_capacity: 256,
        }
    }
}

/// Outbound API endpoints and timeouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Helpdesk API base URL (e.g. "<https://acme.zendesk.example>").
    pub helpdesk_base_url: String,
    /// Cloud support-case API base URL.
    pub cloud_base_url: String,
    /// Per-request timeout for both APIs, well under any invocation ceiling.
    pub request_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            helpdesk_base_url: String::new(),
            cloud_base_url: String::new(),
            request_timeout_secs: 10,
        }
    }
}

/// Names under which credentials are fetched from the secret store.
///
/// Only names live in config; values never do.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretNames {
    /// Bearer token expected on inbound webhook requests.
    pub webhook_bearer: String,
    /// Token for the helpdesk ticketing API.
    pub helpdesk_api_token: String,
    /// Token for the cloud support-case API.
    pub cloud_api_token: String,
    /// Directory for file-mounted secrets; environment variables when unset.
    pub dir: Option<PathBuf>,
}

impl Default for SecretNames {
    fn default() -> Self {
        Self {
            webhook_bearer: "helpdesk_webhook_bearer".to_string(),
            helpdesk_api_token: "helpdesk_api_token".to_string(),
            cloud_api_token: "cloud_api_token".to_string(),
            dir: None,
        }
    }
}

/// Load configuration, overlaying an optional JSON file on the defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.map(Path::to_path_buf).or_else(|| {
        std::env::var("CASEBRIDGE_CONFIG").ok().map(PathBuf::from)
    });

    match path {
        Some(path) if path.exists() => load_config_file(&path),
        _ => Ok(Config::default()),
    }
}

/// Default database path under the user config directory.
pub fn default_database_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("casebridge").join("sync.db"))
}

fn load_config_file(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.bus.max_attempts, 3);
        assert_eq!(config.upstream.request_timeout_secs, 10);
        assert_eq!(config.secrets.webhook_bearer, "helpdesk_webhook_bearer");
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"bus": {"max_attempts": 5, "base_backoff_ms": 100, "queue_capacity": 16}}"#,
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.bus.max_attempts, 5);
        // Untouched sections keep defaults
        assert_eq!(config.upstream.request_timeout_secs, 10);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = load_config(Some(Path::new("/nonexistent/settings.json"))).unwrap();
        assert_eq!(config.bus.queue_capacity, 256);
    }
}
