use crate::builder::{push_key_predicate, push_table, BuildError, BuildResult};
use crate::model::column::Column;
use crate::model::table::Table;
use log::debug;

/// `DELETE FROM t WHERE k1=? AND ...`, keys in declaration order.
#[derive(Debug, Clone)]
pub struct DeleteBuilder<'a> {
    table: &'a Table,
    schema: Option<&'a str>,
    keys: Vec<&'a Column>,
}

impl<'a> DeleteBuilder<'a> {
    pub fn new(table: &'a Table, keys: &[&'a Column]) -> Self {
        Self {
            table,
            schema: table.schema(),
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
                statement: "delete",
                table: self.table.name().to_string(),
            });
        }

        let mut sql = String::with_capacity(32 + self.keys.len() * 24);
        sql.push_str("DELETE FROM ");
        push_table(&mut sql, self.table, self.schema);
        sql.push_str(" WHERE ");
        push_key_predicate(&mut sql, &self.keys);

        debug!(
            "event=sql_build module=builder kind=delete table={} sql={}",
            self.table.name(),
            sql
        );
        Ok(sql)
    }
}
