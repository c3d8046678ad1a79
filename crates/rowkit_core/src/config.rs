//! Runtime configuration.
//!
//! # Responsibility
//! - Describe how connections are opened and how tables are qualified.
//! - Load configuration from JSON documents and validate it before use.
//!
//! # Invariants
//! - A validated config has a non-empty database path and a non-zero
//!   statement cache capacity.

use crate::db::{DbError, DbResult};
use crate::logging::default_log_level;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_STATEMENT_CACHE_CAPACITY: usize = 64;

/// Top-level configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowkitConfig {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
}

impl RowkitConfig {
    /// Parses and validates a JSON configuration document.
    pub fn from_json(json: &str) -> DbResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|err| DbError::InvalidConfig(format!("malformed config json: {err}")))?;
        config.database.validate()?;
        Ok(config)
    }

    /// Reads a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> DbResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }
}

/// Connection and SQL qualification settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database file.
    pub path: PathBuf,
    /// Schema that overrides every table's own schema when set.
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// Per-connection prepared statement cache size.
    #[serde(default = "default_statement_cache_capacity")]
    pub statement_cache_capacity: usize,
    #[serde(default = "default_foreign_keys")]
    pub foreign_keys: bool,
}

impl DatabaseConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            schema: None,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            statement_cache_capacity: DEFAULT_STATEMENT_CACHE_CAPACITY,
            foreign_keys: true,
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// # Errors
    /// - Returns [`DbError::InvalidConfig`] for an empty path, a blank schema
    ///   or a zero statement cache capacity.
    pub fn validate(&self) -> DbResult<()> {
        if self.path.as_os_str().is_empty() {
            return Err(DbError::InvalidConfig(
                "database path cannot be empty".to_string(),
            ));
        }
        if self
            .schema
            .as_deref()
            .is_some_and(|schema| schema.trim().is_empty())
        {
            return Err(DbError::InvalidConfig(
                "schema override cannot be blank".to_string(),
            ));
        }
        if self.statement_cache_capacity == 0 {
            return Err(DbError::InvalidConfig(
                "statement_cache_capacity must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// File logging settings, see [`crate::logging::init_logging`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    pub dir: PathBuf,
}

fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

fn default_statement_cache_capacity() -> usize {
    DEFAULT_STATEMENT_CACHE_CAPACITY
}

fn default_foreign_keys() -> bool {
    true
}

fn default_level() -> String {
    default_log_level().to_string()
}
