//! Immutable descriptor model for tables, columns and entities.
//!
//! # Responsibility
//! - Describe the physical tables and column metadata that SQL builders read.
//! - Validate descriptor sets once, at construction, and never mutate them
//!   afterwards.
//!
//! # Invariants
//! - Column order is insertion order and flows verbatim into generated SQL.
//! - Every entity descriptor has at least one primary-key column.
//! - Every non-derived column belongs to exactly one table.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod column;
pub mod entity;
pub mod module;
pub mod projections;
pub mod table;

pub type DescriptorResult<T> = Result<T, DescriptorError>;

/// Descriptor set rejected at construction time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    EmptyTableName,
    EmptyColumnName {
        table: String,
    },
    DuplicateColumn {
        table: String,
        column: String,
    },
    ForeignColumn {
        table: String,
        column: String,
        owner: String,
    },
    DerivedColumnInEntity {
        table: String,
        column: String,
    },
    MissingPrimaryKey {
        table: String,
    },
    CompositeAutoIncrement {
        table: String,
        key_count: usize,
    },
    DuplicateEntity(String),
    InvalidModuleJson(String),
}

impl Display for DescriptorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTableName => write!(f, "table name cannot be empty"),
            Self::EmptyColumnName { table } => {
                write!(f, "column name cannot be empty in table `{table}`")
            }
            Self::DuplicateColumn { table, column } => {
                write!(f, "duplicate column `{column}` in table `{table}`")
            }
            Self::ForeignColumn {
                table,
                column,
                owner,
            } => write!(
                f,
                "column `{column}` belongs to table `{owner}`, not `{table}`"
            ),
            Self::DerivedColumnInEntity { table, column } => write!(
                f,
                "derived column `{column}` cannot be part of entity table `{table}`"
            ),
            Self::MissingPrimaryKey { table } => {
                write!(f, "table `{table}` must declare at least one primary key")
            }
            Self::CompositeAutoIncrement { table, key_count } => write!(
                f,
                "table `{table}` has {key_count} primary keys; auto-increment requires exactly one"
            ),
            Self::DuplicateEntity(name) => write!(f, "entity `{name}` is registered twice"),
            Self::InvalidModuleJson(message) => {
                write!(f, "invalid module descriptor json: {message}")
            }
        }
    }
}

impl Error for DescriptorError {}
