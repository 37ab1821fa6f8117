//! Store and logging configuration.
//!
//! # Responsibility
//! - Describe how the SQLite store and its connection pool are opened.
//! - Load settings from `JIKONI_*` environment variables.
//!
//! # Invariants
//! - Every setting has a default; only malformed values are errors.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "JIKONI_DB_PATH";
pub const ENV_DB_MAX_CONNECTIONS: &str = "JIKONI_DB_MAX_CONNECTIONS";
pub const ENV_DB_CONNECTION_TIMEOUT_MS: &str = "JIKONI_DB_CONNECTION_TIMEOUT_MS";
pub const ENV_DB_BUSY_TIMEOUT_MS: &str = "JIKONI_DB_BUSY_TIMEOUT_MS";
pub const ENV_LOG_LEVEL: &str = "JIKONI_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "JIKONI_LOG_DIR";

/// Path value selecting a private in-memory database.
pub const MEMORY_PATH: &str = ":memory:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidNumber { key: &'static str, value: String },
    ZeroConnections,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidNumber { key, value } => {
                write!(f, "`{key}` must be a non-negative integer, got `{value}`")
            }
            Self::ZeroConnections => write!(f, "connection pool needs at least one connection"),
        }
    }
}

impl Error for ConfigError {}

/// SQLite store and pool settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Database file path, or `:memory:`.
    #[serde(default = "default_path")]
    pub path: String,

    /// Maximum pooled connections. In-memory stores always use one.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long a call may wait for a pooled connection.
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,

    /// SQLite busy timeout per connection.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// WAL journaling for file stores.
    #[serde(default = "default_true")]
    pub enable_wal: bool,
}

fn default_path() -> String {
    MEMORY_PATH.to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_connection_timeout_ms() -> u64 {
    30_000
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_true() -> bool {
    true
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            max_connections: default_max_connections(),
            connection_timeout_ms: default_connection_timeout_ms(),
            busy_timeout_ms: default_busy_timeout_ms(),
            enable_wal: default_true(),
        }
    }
}

impl StoreConfig {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into().to_string_lossy().into_owned(),
            ..Self::default()
        }
    }

    pub fn is_memory(&self) -> bool {
        self.path == MEMORY_PATH
    }

    /// Loads settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads settings through `lookup`, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(path) = lookup(ENV_DB_PATH).filter(|value| !value.trim().is_empty()) {
            config.path = path.trim().to_string();
        }
        if let Some(value) = lookup(ENV_DB_MAX_CONNECTIONS) {
            config.max_connections = parse_number(ENV_DB_MAX_CONNECTIONS, &value)?;
        }
        if let Some(value) = lookup(ENV_DB_CONNECTION_TIMEOUT_MS) {
            config.connection_timeout_ms = parse_number(ENV_DB_CONNECTION_TIMEOUT_MS, &value)?;
        }
        if let Some(value) = lookup(ENV_DB_BUSY_TIMEOUT_MS) {
            config.busy_timeout_ms = parse_number(ENV_DB_BUSY_TIMEOUT_MS, &value)?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_connections == 0 {
            return Err(ConfigError::ZeroConnections);
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| ConfigError::InvalidNumber {
            key,
            value: value.to_string(),
        })
}

/// Logging settings read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    /// File logging is enabled only when a directory is configured.
    pub dir: Option<String>,
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            level: lookup(ENV_LOG_LEVEL)
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| crate::logging::default_log_level().to_string()),
            dir: lookup(ENV_LOG_DIR).filter(|value| !value.trim().is_empty()),
        }
    }
}
