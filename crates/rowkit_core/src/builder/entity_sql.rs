use crate::builder::{
    key_predicate, quote_identifier, BuildResult, DeleteBuilder, InsertBuilder, SelectBuilder,
    UpdateBuilder,
};
use crate::model::entity::EntityDescriptor;

/// The complete statement set a generated repository needs for one entity.
///
/// Built once per entity and reused for the process lifetime; the SQL text
/// doubles as the transaction statement-cache key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySql {
    insert: String,
    insert_auto_increment: Option<String>,
    update: Option<String>,
    delete: String,
    select_by_id: String,
    select_by_business_key: Option<String>,
    select_all: String,
}

impl EntitySql {
    /// Builds every statement for `entity`, qualifying its table with `schema`.
    pub fn build(entity: &EntityDescriptor, schema: Option<&str>) -> BuildResult<Self> {
        let table = entity.table();
        let keys = entity.primary_keys();
        let business_keys = entity.business_keys();
        let insertable = entity.insertable_columns();
        let updatable = entity.updatable_columns();
        let projection: Vec<_> = entity.columns().iter().collect();

        let insert = InsertBuilder::new(table, &keys, &insertable)
            .schema(schema)
            .build()?;
        let insert_auto_increment = if entity.is_auto_increment() {
            Some(
                InsertBuilder::new(table, &[], &insertable)
                    .schema(schema)
                    .default_values(true)
                    .build()?,
            )
        } else {
            None
        };
        let update = if updatable.is_empty() {
            None
        } else {
            Some(
                UpdateBuilder::new(table, &updatable, &keys)
                    .schema(schema)
                    .build()?,
            )
        };
        let delete = DeleteBuilder::new(table, &keys).schema(schema).build()?;
        let select_by_id = SelectBuilder::new(table, &projection)
            .schema(schema)
            .where_clause(key_predicate(&keys))
            .build()?;
        let select_by_business_key = if business_keys.is_empty() {
            None
        } else {
            Some(
                SelectBuilder::new(table, &projection)
                    .schema(schema)
                    .where_clause(key_predicate(&business_keys))
                    .build()?,
            )
        };
        let order = keys
            .iter()
            .map(|key| quote_identifier(key.name()))
            .collect::<Vec<_>>()
            .join(",");
        let select_all = SelectBuilder::new(table, &projection)
            .schema(schema)
            .order_by(order)
            .build()?;

        Ok(Self {
            insert,
            insert_auto_increment,
            update,
            delete,
            select_by_id,
            select_by_business_key,
            select_all,
        })
    }

    /// Insert with keys first, then insertable columns.
    pub fn insert(&self) -> &str {
        &self.insert
    }

    /// Insert without key columns; present for auto-increment entities.
    pub fn insert_auto_increment(&self) -> Option<&str> {
        self.insert_auto_increment.as_deref()
    }

    /// Absent when the entity has no updatable column.
    pub fn update(&self) -> Option<&str> {
        self.update.as_deref()
    }

    pub fn delete(&self) -> &str {
        &self.delete
    }

    /// Every column, filtered by primary key.
    pub fn select_by_id(&self) -> &str {
        &self.select_by_id
    }

    /// Every column, filtered by business key; absent without one.
    pub fn select_by_business_key(&self) -> Option<&str> {
        self.select_by_business_key.as_deref()
    }

    /// Every row ordered by primary key.
    pub fn select_all(&self) -> &str {
        &self.select_all
    }
}
