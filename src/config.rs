//! Application configuration
//!
//! One JSON file, every field optional:
//!
//! ```json
//! {
//!   "server":   { "host": "0.0.0.0", "port": 3000, "static_dir": "./public" },
//!   "database": { "path": "./compliance.db", "pool_size": 4 },
//!   "blobs":    { "backend": "filesystem", "dir": "./uploads" },
//!   "log_filter": "info"
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::blob::BlobConfig;
use crate::db::DatabaseConfig;
use crate::http_server::HttpServerConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub server: HttpServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub blobs: BlobConfig,

    /// Default tracing filter; `RUST_LOG` takes precedence (default: "info")
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: HttpServerConfig::default(),
            database: DatabaseConfig::default(),
            blobs: BlobConfig::default(),
            log_filter: default_log_filter(),
        }
    }
}

impl Config {
    /// Load and validate a configuration file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json(&content)
    }

    /// Load `path` if it exists; otherwise fall back to defaults.
    ///
    /// With `required` set, a missing file is an error.
    pub fn load_or_default(path: &Path, required: bool) -> ConfigResult<Self> {
        if !required && !path.exists() {
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        }
        Self::load(path)
    }

    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: Config = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must be > 0".into()));
        }
        if self.server.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid("server.max_upload_bytes must be > 0".into()));
        }
        if self.database.path.trim().is_empty() {
            return Err(ConfigError::Invalid("database.path must not be empty".into()));
        }
        if self.database.pool_size == 0 {
            return Err(ConfigError::Invalid("database.pool_size must be > 0".into()));
        }
        if self.database.busy_timeout_ms == 0 || self.database.acquire_timeout_ms == 0 {
            return Err(ConfigError::Invalid("database timeouts must be > 0".into()));
        }
        Ok(())
    }
}
