use super::{open_connection, DbResult};
use crate::config::DatabaseConfig;
use rusqlite::Connection;

/// Produces live connections for transactions.
///
/// Every call must return a connection no other transaction holds.
pub trait ConnectionFactory: Send + Sync {
    fn connect(&self) -> DbResult<Connection>;
}

impl<F> ConnectionFactory for F
where
    F: Fn() -> DbResult<Connection> + Send + Sync,
{
    fn connect(&self) -> DbResult<Connection> {
        self()
    }
}

/// Opens a fresh SQLite connection per call from a [`DatabaseConfig`].
#[derive(Debug, Clone)]
pub struct SqliteConnectionFactory {
    config: DatabaseConfig,
}

impl SqliteConnectionFactory {
    /// # Errors
    /// - Returns a config validation error.
    pub fn new(config: DatabaseConfig) -> DbResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }
}

impl ConnectionFactory for SqliteConnectionFactory {
    fn connect(&self) -> DbResult<Connection> {
        open_connection(&self.config)
    }
}
