//! Descriptor ingestion boundary.
//!
//! # Responsibility
//! - Accept the entity-identity → descriptor mapping produced by the external
//!   generation step, either as values or as the JSON document it emits.
//!
//! # Invariants
//! - Entity identities are unique within a module.
//! - Registration order is preserved.

use crate::model::column::{Column, ColumnFlags};
use crate::model::entity::EntityDescriptor;
use crate::model::table::Table;
use crate::model::{DescriptorError, DescriptorResult};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Named, immutable set of entity descriptors.
#[derive(Debug, Clone)]
pub struct Module {
    name: String,
    schema: Option<String>,
    entities: Vec<Arc<EntityDescriptor>>,
    by_name: HashMap<String, usize>,
}

impl Module {
    /// Registers `entities` under module `name`.
    ///
    /// # Errors
    /// - Returns [`DescriptorError::DuplicateEntity`] when an identity repeats.
    pub fn new(
        name: impl Into<String>,
        schema: Option<String>,
        entities: Vec<EntityDescriptor>,
    ) -> DescriptorResult<Self> {
        let mut by_name = HashMap::with_capacity(entities.len());
        let mut registered = Vec::with_capacity(entities.len());
        for (index, entity) in entities.into_iter().enumerate() {
            if by_name.insert(entity.name().to_string(), index).is_some() {
                return Err(DescriptorError::DuplicateEntity(entity.name().to_string()));
            }
            registered.push(Arc::new(entity));
        }

        Ok(Self {
            name: name.into(),
            schema: schema.filter(|value| !value.trim().is_empty()),
            entities: registered,
            by_name,
        })
    }

    /// Parses and validates the generator's JSON output.
    ///
    /// # Errors
    /// - [`DescriptorError::InvalidModuleJson`] for malformed documents.
    /// - Any entity construction error.
    pub fn from_json(json: &str) -> DescriptorResult<Self> {
        let spec: ModuleSpec = serde_json::from_str(json)
            .map_err(|err| DescriptorError::InvalidModuleJson(err.to_string()))?;

        let entities = spec
            .entities
            .into_iter()
            .map(EntitySpec::into_descriptor)
            .collect::<DescriptorResult<Vec<_>>>()?;
        let module = Self::new(spec.name, spec.schema, entities)?;

        info!(
            "event=module_load module=model status=ok name={} entities={}",
            module.name,
            module.entities.len()
        );
        Ok(module)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Default schema for tables that do not declare one.
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    pub fn entity(&self, name: &str) -> Option<&Arc<EntityDescriptor>> {
        self.by_name.get(name).map(|index| &self.entities[*index])
    }

    /// Entities in registration order.
    pub fn entities(&self) -> impl Iterator<Item = &Arc<EntityDescriptor>> {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[derive(Debug, Deserialize, Serialize)]
struct ModuleSpec {
    name: String,
    #[serde(default)]
    schema: Option<String>,
    entities: Vec<EntitySpec>,
}

#[derive(Debug, Deserialize, Serialize)]
struct EntitySpec {
    entity: String,
    table: Table,
    columns: Vec<ColumnSpec>,
    #[serde(default)]
    auto_increment: bool,
}

impl EntitySpec {
    fn into_descriptor(self) -> DescriptorResult<EntityDescriptor> {
        let table_name = self.table.name().to_string();
        let columns = self
            .columns
            .into_iter()
            .map(|column| column.into_column(&table_name))
            .collect();

        let descriptor = EntityDescriptor::new(self.entity, self.table, columns)?;
        if self.auto_increment {
            descriptor.auto_increment()
        } else {
            Ok(descriptor)
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
enum ColumnSpecKind {
    #[default]
    Column,
    PrimaryKey,
    BusinessKey,
}

#[derive(Debug, Deserialize, Serialize)]
struct ColumnSpec {
    name: String,
    #[serde(default)]
    kind: ColumnSpecKind,
    #[serde(default)]
    nullable: bool,
    #[serde(default = "default_true")]
    insertable: bool,
    #[serde(default = "default_true")]
    updatable: bool,
}

impl ColumnSpec {
    fn into_column(self, table: &str) -> Column {
        let flags = ColumnFlags {
            nullable: self.nullable,
            insertable: self.insertable,
            updatable: self.updatable,
        };
        match self.kind {
            ColumnSpecKind::Column => Column::single(table, self.name, flags),
            ColumnSpecKind::PrimaryKey => Column::primary_key(table, self.name),
            ColumnSpecKind::BusinessKey => Column::business_key(table, self.name, flags),
        }
    }
}

fn default_true() -> bool {
    true
}
