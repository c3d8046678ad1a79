//! Transactions and their per-transaction statement cache.
//!
//! # Responsibility
//! - Own one live connection for a unit of work.
//! - Memoize one statement handle per (role, SQL text) and accumulate batches.
//! - Release statements and the connection exactly once on every exit path.
//!
//! # Invariants
//! - A transaction is confined to the caller that opened it; nothing in the
//!   crate stores a "current" transaction.
//! - Handles are invalid once their transaction has ended.
//! - Dropping an active transaction rolls it back.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

mod cache;
mod manager;
mod transaction;

pub use cache::{StatementHandle, StatementRole};
pub use manager::TransactionManager;
pub use transaction::{BatchReport, Transaction, TransactionMode, TransactionState};

/// Identity of one transaction, stamped into every handle it returns.
pub type TransactionId = Uuid;

pub type TxResult<T> = Result<T, TxError>;

#[derive(Debug)]
pub enum TxError {
    /// Connection could not be acquired.
    Db(DbError),
    Begin(rusqlite::Error),
    Commit(rusqlite::Error),
    Rollback(rusqlite::Error),
    /// Transaction already committed, rolled back or closed.
    Closed {
        id: TransactionId,
        state: TransactionState,
    },
    /// Write statement requested on a read-only transaction.
    ReadOnly {
        sql: String,
    },
    /// Handle issued by another transaction.
    ForeignHandle {
        expected: TransactionId,
        actual: TransactionId,
    },
    UnknownHandle {
        slot: usize,
    },
    /// Handle used for an operation its role does not allow.
    RoleMismatch {
        sql: String,
        expected: StatementRole,
        actual: StatementRole,
    },
    /// `execute` called on a handle registered as neither insert nor update.
    NotExecutable {
        sql: String,
        role: StatementRole,
    },
    /// The underlying prepare/execute/fetch call failed.
    Execution {
        sql: String,
        source: rusqlite::Error,
    },
}

impl TxError {
    pub(crate) fn execution(sql: &str, source: rusqlite::Error) -> Self {
        Self::Execution {
            sql: sql.to_string(),
            source,
        }
    }
}

impl Display for TxError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "cannot acquire connection: {err}"),
            Self::Begin(err) => write!(f, "failed to begin transaction: {err}"),
            Self::Commit(err) => write!(f, "failed to commit transaction: {err}"),
            Self::Rollback(err) => write!(f, "failed to roll back transaction: {err}"),
            Self::Closed { id, state } => write!(f, "transaction {id} is closed ({state})"),
            Self::ReadOnly { sql } => {
                write!(f, "write statement on read-only transaction: {sql}")
            }
            Self::ForeignHandle { expected, actual } => write!(
                f,
                "statement handle belongs to transaction {actual}, not {expected}"
            ),
            Self::UnknownHandle { slot } => write!(f, "unknown statement handle slot {slot}"),
            Self::RoleMismatch {
                sql,
                expected,
                actual,
            } => write!(
                f,
                "statement registered as {actual} used as {expected}: {sql}"
            ),
            Self::NotExecutable { sql, role } => write!(
                f,
                "statement registered as {role} cannot be executed directly: {sql}"
            ),
            Self::Execution { sql, source } => write!(f, "execution failed for `{sql}`: {source}"),
        }
    }
}

impl Error for TxError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Begin(err) | Self::Commit(err) | Self::Rollback(err) => Some(err),
            Self::Execution { source, .. } => Some(source),
            Self::Closed { .. }
            | Self::ReadOnly { .. }
            | Self::ForeignHandle { .. }
            | Self::UnknownHandle { .. }
            | Self::RoleMismatch { .. }
            | Self::NotExecutable { .. } => None,
        }
    }
}

impl From<DbError> for TxError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}
