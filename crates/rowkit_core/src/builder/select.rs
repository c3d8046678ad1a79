use crate::builder::{push_column, push_table, BuildError, BuildResult};
use crate::model::column::Column;
use crate::model::table::Table;
use log::debug;

/// `SELECT <projection> FROM t [WHERE ...] [ORDER BY ...] [LIMIT n]`.
///
/// The projection is the caller's explicit ordered list, derived columns
/// included. WHERE and ORDER BY are caller-supplied fragments; the builder
/// never infers predicates.
#[derive(Debug, Clone)]
pub struct SelectBuilder<'a> {
    table: &'a Table,
    schema: Option<&'a str>,
    columns: Vec<&'a Column>,
    where_clause: Option<String>,
    order_by: Option<String>,
    limit: Option<u32>,
}

impl<'a> SelectBuilder<'a> {
    pub fn new(table: &'a Table, columns: &[&'a Column]) -> Self {
        Self {
            table,
            schema: table.schema(),
            columns: columns.to_vec(),
            where_clause: None,
            order_by: None,
            limit: None,
        }
    }

    pub fn schema(mut self, schema: Option<&'a str>) -> Self {
        self.schema = schema;
        self
    }

    pub fn where_clause(mut self, fragment: impl Into<String>) -> Self {
        self.where_clause = Some(fragment.into());
        self
    }

    pub fn order_by(mut self, fragment: impl Into<String>) -> Self {
        self.order_by = Some(fragment.into());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn build(&self) -> BuildResult<String> {
        if self.columns.is_empty() {
            return Err(BuildError::EmptyColumnList {
                statement: "select",
                table: self.table.name().to_string(),
            });
        }

        let mut sql = String::with_capacity(64 + self.columns.len() * 24);
        sql.push_str("SELECT ");
        for (index, column) in self.columns.iter().enumerate() {
            if column.table() != self.table.name() {
                return Err(BuildError::MixedTables {
                    first: self.table.name().to_string(),
                    other: column.table().to_string(),
                });
            }
            if index > 0 {
                sql.push(',');
            }
            push_column(&mut sql, column);
        }
        sql.push_str(" FROM ");
        push_table(&mut sql, self.table, self.schema);

        if let Some(fragment) = self.where_clause.as_deref().filter(|f| !f.trim().is_empty()) {
            sql.push_str(" WHERE ");
            sql.push_str(fragment);
        }
        if let Some(fragment) = self.order_by.as_deref().filter(|f| !f.trim().is_empty()) {
            sql.push_str(" ORDER BY ");
            sql.push_str(fragment);
        }
        if let Some(limit) = self.limit {
            sql.push_str(" LIMIT ");
            sql.push_str(&limit.to_string());
        }

        debug!(
            "event=sql_build module=builder kind=select table={} sql={}",
            self.table.name(),
            sql
        );
        Ok(sql)
    }
}
