//! SQLite connection bootstrap and the connection boundary.
//!
//! # Responsibility
//! - Open and configure SQLite connections.
//! - Define the factory contract transactions acquire connections through.
//!
//! # Invariants
//! - Returned connections have the configured pragmas applied.
//! - Pooling and reconnection are the factory implementor's concern.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod factory;
mod open;

pub use factory::{ConnectionFactory, SqliteConnectionFactory};
pub use open::open_connection;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    Io(std::io::Error),
    InvalidConfig(String),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::InvalidConfig(message) => write!(f, "invalid configuration: {message}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::InvalidConfig(_) => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<std::io::Error> for DbError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}
