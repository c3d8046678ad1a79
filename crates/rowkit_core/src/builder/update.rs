use crate::builder::{push_identifier, push_key_predicate, push_table, BuildError, BuildResult};
use crate::model::column::Column;
use crate::model::table::Table;
use log::debug;

/// `UPDATE t SET c=?, ... WHERE k1=? AND k2=?`.
///
/// The SET list keeps only updatable, non-key, non-derived columns; the WHERE
/// list is exactly the keys in declaration order.
#[derive(Debug, Clone)]
pub struct UpdateBuilder<'a> {
    table: &'a Table,
    schema: Option<&'a str>,
    columns: Vec<&'a Column>,
    keys: Vec<&'a Column>,
}

impl<'a> UpdateBuilder<'a> {
    pub fn new(table: &'a Table, columns: &[&'a Column], keys: &[&'a Column]) -> Self {
        Self {
            table,
            schema: table.schema(),
            columns: columns.to_vec(),
            keys: keys.to_vec(),
        }
    }

    pub fn schema(mut self, schema: Option<&'a str>) -> Self {
        self.schema = schema;
        self
    }

    pub fn build(&self) -> BuildResult<String> {
        if self.keys.is_empty() {
            return Err(BuildError::MissingPrimaryKey {
                statement: "update",
                table: self.table.name().to_string(),
            });
        }

        let mut sql = String::with_capacity(64 + (self.columns.len() + self.keys.len()) * 24);
        sql.push_str("UPDATE ");
        push_table(&mut sql, self.table, self.schema);
        sql.push_str(" SET ");

        let mut assigned = 0usize;
        for column in &self.columns {
            if column.is_primary_key() || column.is_derived() || !column.is_updatable() {
                debug!(
                    "event=sql_build module=builder kind=update status=skip table={} column={}",
                    self.table.name(),
                    column.name()
                );
                continue;
            }
            if assigned > 0 {
                sql.push(',');
            }
            push_identifier(&mut sql, column.name());
            sql.push_str("=?");
            assigned += 1;
        }

        if assigned == 0 {
            return Err(BuildError::NoUpdatableColumns {
                table: self.table.name().to_string(),
            });
        }

        sql.push_str(" WHERE ");
        push_key_predicate(&mut sql, &self.keys);

        debug!(
            "event=sql_build module=builder kind=update table={} sql={}",
            self.table.name(),
            sql
        );
        Ok(sql)
    }
}
