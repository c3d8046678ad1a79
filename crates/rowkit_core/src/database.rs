//! Database handle tying descriptors, memoized SQL and transactions together.
//!
//! # Responsibility
//! - Own the ingested [`Module`] and the [`TransactionManager`].
//! - Resolve which schema qualifies each table.
//! - Build each entity's [`EntitySql`] once and share it read-only.
//!
//! # Invariants
//! - A `Database` is immutable after construction and safe to share
//!   across threads; transactions opened from it are not.

use crate::builder::EntitySql;
use crate::config::DatabaseConfig;
use crate::db::{ConnectionFactory, DbResult, SqliteConnectionFactory};
use crate::model::entity::EntityDescriptor;
use crate::model::module::Module;
use crate::model::table::Table;
use crate::repo::{RepoError, RepoResult};
use crate::tx::TransactionManager;
use log::info;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::Arc;

/// Schema qualifying `table` inside `module`: `schema_override` wins, then
/// the table's own schema, then the module default.
pub fn resolve_schema<'a>(
    schema_override: Option<&'a str>,
    table: &'a Table,
    module: &'a Module,
) -> Option<&'a str> {
    schema_override
        .or_else(|| table.schema())
        .or_else(|| module.schema())
}

pub struct Database {
    module: Module,
    schema_override: Option<String>,
    transactions: TransactionManager,
    statements: HashMap<String, OnceCell<EntitySql>>,
}

impl Database {
    /// Opens a SQLite-backed database described by `config`.
    ///
    /// Connections are opened lazily, one per transaction.
    pub fn open(config: DatabaseConfig, module: Module) -> DbResult<Self> {
        let schema_override = config.schema.clone();
        let factory = SqliteConnectionFactory::new(config)?;
        Ok(Self::with_factory(factory, module, schema_override))
    }

    /// Builds a database over any connection factory.
    pub fn with_factory(
        factory: impl ConnectionFactory + 'static,
        module: Module,
        schema_override: Option<String>,
    ) -> Self {
        let statements = module
            .entities()
            .map(|entity| (entity.name().to_string(), OnceCell::new()))
            .collect();

        info!(
            "event=database_init module=database status=ok module_name={} entities={}",
            module.name(),
            module.len()
        );
        Self {
            module,
            schema_override,
            transactions: TransactionManager::new(factory),
            statements,
        }
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn transaction_manager(&self) -> &TransactionManager {
        &self.transactions
    }

    pub fn descriptor(&self, entity: &str) -> RepoResult<&Arc<EntityDescriptor>> {
        self.module
            .entity(entity)
            .ok_or_else(|| RepoError::UnknownEntity(entity.to_string()))
    }

    /// Schema used to qualify `table`: the configured override, then the
    /// table's own schema, then the module default.
    pub fn schema_for<'a>(&'a self, table: &'a Table) -> Option<&'a str> {
        resolve_schema(self.schema_override.as_deref(), table, &self.module)
    }

    /// Memoized statement set for `entity`, built on first request.
    pub fn statements(&self, entity: &str) -> RepoResult<&EntitySql> {
        let descriptor = self.descriptor(entity)?;
        let cell = self
            .statements
            .get(entity)
            .ok_or_else(|| RepoError::UnknownEntity(entity.to_string()))?;
        let sql = cell.get_or_try_init(|| {
            EntitySql::build(descriptor, self.schema_for(descriptor.table()))
        })?;
        Ok(sql)
    }
}
