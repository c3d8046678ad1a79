//! SQL statement builders.
//!
//! # Responsibility
//! - Turn descriptors into parameterized INSERT/UPDATE/SELECT/DELETE text.
//! - Delimit every table and column identifier with a backtick.
//!
//! # Invariants
//! - Builders are pure: identical descriptor input yields byte-identical SQL,
//!   which is what makes statement caching keyed by SQL text sound.
//! - Placeholders are positional `?` in column order.
//! - Keyed statements (UPDATE/DELETE) are never built without a primary key.

use crate::model::column::{Column, ColumnKind};
use crate::model::table::Table;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod delete;
mod entity_sql;
mod insert;
mod select;
mod update;

pub use delete::DeleteBuilder;
pub use entity_sql::EntitySql;
pub use insert::InsertBuilder;
pub use select::SelectBuilder;
pub use update::UpdateBuilder;

/// Identifier delimiter shared by every builder.
pub const QUOTE: char = '`';

pub type BuildResult<T> = Result<T, BuildError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// Keyed statement requested for a table without primary keys.
    MissingPrimaryKey {
        statement: &'static str,
        table: String,
    },
    /// Neither keys nor columns were supplied.
    EmptyColumnList {
        statement: &'static str,
        table: String,
    },
    /// UPDATE whose SET list would be empty.
    NoUpdatableColumns {
        table: String,
    },
    /// Derived column used in a write statement.
    DerivedColumn {
        statement: &'static str,
        column: String,
    },
    /// SELECT projection spanning more than one table.
    MixedTables {
        first: String,
        other: String,
    },
}

impl Display for BuildError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingPrimaryKey { statement, table } => {
                write!(f, "cannot build {statement} for `{table}`: no primary key")
            }
            Self::EmptyColumnList { statement, table } => {
                write!(f, "cannot build {statement} for `{table}`: no columns")
            }
            Self::NoUpdatableColumns { table } => {
                write!(f, "cannot build update for `{table}`: no updatable columns")
            }
            Self::DerivedColumn { statement, column } => {
                write!(f, "derived column `{column}` cannot appear in {statement}")
            }
            Self::MixedTables { first, other } => write!(
                f,
                "select projection mixes tables `{first}` and `{other}`; joins are unsupported"
            ),
        }
    }
}

impl Error for BuildError {}

/// Appends `identifier` delimited by [`QUOTE`], doubling embedded quotes.
pub(crate) fn push_identifier(sql: &mut String, identifier: &str) {
    sql.push(QUOTE);
    for ch in identifier.chars() {
        if ch == QUOTE {
            sql.push(QUOTE);
        }
        sql.push(ch);
    }
    sql.push(QUOTE);
}

/// Delimited identifier as an owned string.
pub fn quote_identifier(identifier: &str) -> String {
    let mut sql = String::with_capacity(identifier.len() + 2);
    push_identifier(&mut sql, identifier);
    sql
}

/// Appends `` `schema`.`table` `` or `` `table` ``.
pub(crate) fn push_table(sql: &mut String, table: &Table, schema: Option<&str>) {
    if let Some(schema) = schema.filter(|value| !value.is_empty()) {
        push_identifier(sql, schema);
        sql.push('.');
    }
    push_identifier(sql, table.name());
}

/// Appends a projected column; derived columns render as `FN(`inner`)`.
pub(crate) fn push_column(sql: &mut String, column: &Column) {
    match column.kind() {
        ColumnKind::Derived { function, inner } => {
            sql.push_str(function.as_sql());
            sql.push('(');
            push_column(sql, inner);
            sql.push(')');
        }
        _ => push_identifier(sql, column.name()),
    }
}

/// Renders `` `a`=? AND `b`=? `` for `columns` in the given order.
///
/// Used for key WHERE clauses and for caller-built lookup fragments.
pub fn key_predicate(columns: &[&Column]) -> String {
    let mut sql = String::with_capacity(columns.len() * 16);
    push_key_predicate(&mut sql, columns);
    sql
}

pub(crate) fn push_key_predicate(sql: &mut String, columns: &[&Column]) {
    for (index, column) in columns.iter().enumerate() {
        if index > 0 {
            sql.push_str(" AND ");
        }
        push_identifier(sql, column.name());
        sql.push_str("=?");
    }
}
