//! Repository runtime shared by generated repositories.
//!
//! # Responsibility
//! - Orchestrate builder output, the transaction statement cache and
//!   caller-supplied mapping callbacks into CRUD primitives.
//!
//! # Invariants
//! - Every write expects exactly one affected row; any other count is an
//!   error, never a silent no-op.
//! - Binding, mapping and execution failures always propagate with the SQL
//!   text that produced them.
//!
//! # See also
//! - `crate::tx` for statement caching and batch ordering.

use crate::builder::BuildError;
use crate::mapper::MapperError;
use crate::model::DescriptorError;
use crate::tx::TxError;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod repository;

pub use repository::Repository;

pub type RepoResult<T> = Result<T, RepoError>;

/// One batch parameter set whose affected-row count was not 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchMismatch {
    pub sql: String,
    /// Position of the parameter set within its statement's batch.
    pub index: usize,
    pub actual: usize,
}

#[derive(Debug)]
pub enum RepoError {
    Tx(TxError),
    Build(BuildError),
    Descriptor(DescriptorError),
    UnknownEntity(String),
    /// Entity has no statement of this kind (e.g. nothing updatable).
    MissingStatement {
        entity: String,
        statement: &'static str,
    },
    ParameterBinding {
        sql: String,
        binder: &'static str,
        entity: String,
        source: MapperError,
    },
    RowMapping {
        sql: String,
        mapper: &'static str,
        source: MapperError,
    },
    IdAssignment {
        sql: String,
        setter: &'static str,
        source: MapperError,
    },
    UnexpectedAffectedRowCount {
        sql: String,
        expected: usize,
        actual: usize,
    },
    BatchRowCount(Vec<BatchMismatch>),
}

impl RepoError {
    /// Whether the underlying execute call itself failed.
    pub fn is_execution(&self) -> bool {
        matches!(self, Self::Tx(TxError::Execution { .. }))
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tx(err) => write!(f, "{err}"),
            Self::Build(err) => write!(f, "{err}"),
            Self::Descriptor(err) => write!(f, "{err}"),
            Self::UnknownEntity(name) => write!(f, "entity `{name}` is not registered"),
            Self::MissingStatement { entity, statement } => {
                write!(f, "entity `{entity}` has no {statement} statement")
            }
            Self::ParameterBinding {
                sql,
                binder,
                entity,
                source,
            } => write!(
                f,
                "parameter binder `{binder}` failed for `{sql}` with {entity}: {source}"
            ),
            Self::RowMapping {
                sql,
                mapper,
                source,
            } => write!(f, "row mapper `{mapper}` failed for `{sql}`: {source}"),
            Self::IdAssignment {
                sql,
                setter,
                source,
            } => write!(f, "id setter `{setter}` failed after `{sql}`: {source}"),
            Self::UnexpectedAffectedRowCount {
                sql,
                expected,
                actual,
            } => write!(
                f,
                "`{sql}` affected {actual} rows, expected {expected}"
            ),
            Self::BatchRowCount(mismatches) => {
                write!(f, "{} batch entries affected an unexpected row count", mismatches.len())?;
                for mismatch in mismatches {
                    write!(
                        f,
                        "; `{}` #{} affected {}",
                        mismatch.sql, mismatch.index, mismatch.actual
                    )?;
                }
                Ok(())
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Tx(err) => Some(err),
            Self::Build(err) => Some(err),
            Self::Descriptor(err) => Some(err),
            Self::ParameterBinding { source, .. }
            | Self::RowMapping { source, .. }
            | Self::IdAssignment { source, .. } => Some(source),
            Self::UnknownEntity(_)
            | Self::MissingStatement { .. }
            | Self::UnexpectedAffectedRowCount { .. }
            | Self::BatchRowCount(_) => None,
        }
    }
}

impl From<TxError> for RepoError {
    fn from(value: TxError) -> Self {
        Self::Tx(value)
    }
}

impl From<BuildError> for RepoError {
    fn from(value: BuildError) -> Self {
        Self::Build(value)
    }
}

impl From<DescriptorError> for RepoError {
    fn from(value: DescriptorError) -> Self {
        Self::Descriptor(value)
    }
}
