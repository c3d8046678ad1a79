//! Entity descriptor: one table plus its ordered, validated column set.
//!
//! # Responsibility
//! - Hold the metadata an external generator emits for one entity shape.
//! - Provide the key/flag filtered column views consumed by SQL builders.
//!
//! # Invariants
//! - Construction is the only place descriptor errors can occur.
//! - At least one primary key; column names are unique and non-empty.
//! - Columns all belong to the entity table; derived columns are rejected.

use crate::model::column::Column;
use crate::model::table::Table;
use crate::model::{DescriptorError, DescriptorResult};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDescriptor {
    name: String,
    table: Table,
    columns: Vec<Column>,
    auto_increment: bool,
}

impl EntityDescriptor {
    /// Validates and builds a descriptor for entity `name` mapped on `table`.
    ///
    /// # Errors
    /// - Returns [`DescriptorError`] when the table or column set is invalid.
    pub fn new(
        name: impl Into<String>,
        table: Table,
        columns: Vec<Column>,
    ) -> DescriptorResult<Self> {
        if table.name().trim().is_empty() {
            return Err(DescriptorError::EmptyTableName);
        }

        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if column.name().trim().is_empty() {
                return Err(DescriptorError::EmptyColumnName {
                    table: table.name().to_string(),
                });
            }
            if column.table() != table.name() {
                return Err(DescriptorError::ForeignColumn {
                    table: table.name().to_string(),
                    column: column.name().to_string(),
                    owner: column.table().to_string(),
                });
            }
            if column.is_derived() {
                return Err(DescriptorError::DerivedColumnInEntity {
                    table: table.name().to_string(),
                    column: column.name().to_string(),
                });
            }
            if !seen.insert(column.name()) {
                return Err(DescriptorError::DuplicateColumn {
                    table: table.name().to_string(),
                    column: column.name().to_string(),
                });
            }
        }

        if !columns.iter().any(Column::is_primary_key) {
            return Err(DescriptorError::MissingPrimaryKey {
                table: table.name().to_string(),
            });
        }

        Ok(Self {
            name: name.into(),
            table,
            columns,
            auto_increment: false,
        })
    }

    /// Marks the single primary key as generated by the store.
    ///
    /// # Errors
    /// - Returns [`DescriptorError::CompositeAutoIncrement`] for composite keys.
    pub fn auto_increment(mut self) -> DescriptorResult<Self> {
        let key_count = self.primary_keys().len();
        if key_count != 1 {
            return Err(DescriptorError::CompositeAutoIncrement {
                table: self.table.name().to_string(),
                key_count,
            });
        }
        self.auto_increment = true;
        Ok(self)
    }

    /// Entity identity (the generated interface name).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// All columns in declaration order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name() == name)
    }

    pub fn is_auto_increment(&self) -> bool {
        self.auto_increment
    }

    /// Primary keys in declaration order.
    pub fn primary_keys(&self) -> Vec<&Column> {
        self.columns
            .iter()
            .filter(|column| column.is_primary_key())
            .collect()
    }

    pub fn business_keys(&self) -> Vec<&Column> {
        self.columns
            .iter()
            .filter(|column| column.is_business_key())
            .collect()
    }

    /// Non-key columns flagged insertable, in declaration order.
    pub fn insertable_columns(&self) -> Vec<&Column> {
        self.columns
            .iter()
            .filter(|column| !column.is_primary_key() && column.is_insertable())
            .collect()
    }

    /// Non-key columns flagged updatable, in declaration order.
    pub fn updatable_columns(&self) -> Vec<&Column> {
        self.columns
            .iter()
            .filter(|column| !column.is_primary_key() && column.is_updatable())
            .collect()
    }
}
