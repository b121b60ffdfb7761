//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::api::ApiConfig;
use crate::client::ClientConfig;
use crate::dashboard::DashboardConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Prediction backend
    #[serde(default)]
    pub server: ApiConfig,

    /// Dashboard's connection to the backend
    #[serde(default)]
    pub client: ClientConfig,

    #[serde(default)]
    pub dashboard: DashboardConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|e| match e {
            ConfigError::Parse { error, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                error,
            },
            other => other,
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            error: e.to_string(),
        })
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("paylens").join("config.toml")),
            Some(PathBuf::from("/etc/paylens/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        // Server overrides
        if let Some(host) = lookup("PAYLENS_API_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PAYLENS_API_PORT") {
            match port.parse() {
                Ok(p) => self.server.port = p,
                Err(_) => tracing::warn!("Ignoring invalid PAYLENS_API_PORT: {}", port),
            }
        }
        if let Some(path) = lookup("PAYLENS_MODEL_PATH") {
            self.server.model_path = Some(PathBuf::from(path));
        }

        // Client overrides
        if let Some(url) = lookup("PAYLENS_API_URL") {
            self.client.base_url = url;
        }

        // Logging overrides
        if let Some(level) = lookup("PAYLENS_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("PAYLENS_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Paylens Configuration
#
# Environment variables override these settings:
# - PAYLENS_API_HOST
# - PAYLENS_API_PORT
# - PAYLENS_MODEL_PATH
# - PAYLENS_API_URL
# - PAYLENS_LOG_LEVEL
# - PAYLENS_LOG_FORMAT

[server]
# Prediction API host
host = "0.0.0.0"

# Prediction API port
port = 8082

# Maximum request body size (bytes)
max_body_size = 65536

# Model artifact (JSON); the built-in baseline is used when unset
# model_path = "/var/lib/paylens/model.json"

[client]
# Backend the dashboard submits to
base_url = "http://localhost:8082"

# Prediction endpoint path
predict_path = "/predict"

# Request timeout in milliseconds (0 = no timeout)
request_timeout_ms = 0

[dashboard]
# Salary the charts animate to for a >$50K prediction
high_salary = 75000

# Salary the charts animate to for a <=$50K prediction
low_salary = 45000

# How long each chart cell takes to reach its new value (ms)
animation_duration_ms = 1000

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
