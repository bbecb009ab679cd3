//! Database configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Path value selecting a private in-memory database
pub const IN_MEMORY: &str = ":memory:";

/// Relational store configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// SQLite file path, or `:memory:` (default: "./compliance.db")
    #[serde(default = "default_path")]
    pub path: String,

    /// Connections kept open (default: 4, always 1 in memory)
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// How long SQLite waits on a locked database (default: 5000)
    #[serde(default = "default_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// How long a request waits for a free connection (default: 5000)
    #[serde(default = "default_timeout_ms")]
    pub acquire_timeout_ms: u64,
}

fn default_path() -> String {
    "./compliance.db".to_string()
}

fn default_pool_size() -> usize {
    4
}

fn default_timeout_ms() -> u64 {
    5000
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            pool_size: default_pool_size(),
            busy_timeout_ms: default_timeout_ms(),
            acquire_timeout_ms: default_timeout_ms(),
        }
    }
}

impl DatabaseConfig {
    /// Private in-memory database, for tests and throwaway runs
    pub fn in_memory() -> Self {
        Self {
            path: IN_MEMORY.to_string(),
            pool_size: 1,
            ..Default::default()
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.path == IN_MEMORY
    }

    /// Effective number of connections
    pub fn effective_pool_size(&self) -> usize {
        if self.is_in_memory() {
            1
        } else {
            self.pool_size
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }
}
