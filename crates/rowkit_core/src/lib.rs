//! Descriptor-driven data access over SQLite.
//!
//! Entity descriptors are compiled into parameterized SQL once, and
//! repositories execute that SQL inside explicit transactions that cache
//! prepared statements for their lifetime.

pub mod builder;
pub mod config;
pub mod database;
pub mod db;
pub mod logging;
pub mod mapper;
pub mod model;
pub mod repo;
pub mod tx;

pub use builder::{BuildError, BuildResult, EntitySql};
pub use config::{DatabaseConfig, LoggingConfig, RowkitConfig};
pub use database::{resolve_schema, Database};
pub use db::{ConnectionFactory, DbError, DbResult, SqliteConnectionFactory};
pub use logging::{default_log_level, init_logging, init_stderr_logging, logging_status};
pub use mapper::{
    GeneratedKey, IdSetter, MapperError, MapperResult, NoParams, ParameterBinder, Params,
    RowMapper,
};
pub use model::column::{Column, ColumnFlags, ColumnKind, SqlFunction};
pub use model::entity::EntityDescriptor;
pub use model::module::Module;
pub use model::projections::Projections;
pub use model::table::Table;
pub use model::{DescriptorError, DescriptorResult};
pub use repo::{BatchMismatch, RepoError, RepoResult, Repository};
pub use tx::{
    BatchReport, StatementHandle, StatementRole, Transaction, TransactionManager,
    TransactionMode, TransactionState, TxError, TxResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
