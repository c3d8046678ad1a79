use crate::builder::{push_identifier, push_table, BuildError, BuildResult};
use crate::model::column::Column;
use crate::model::table::Table;
use log::debug;

/// `INSERT INTO t (keys..., columns...) VALUES (?, ...)`.
///
/// Emits every column it is given: callers pass keys plus the already
/// filtered insertable columns. An empty key list builds an insert that
/// leaves key generation to the store.
#[derive(Debug, Clone)]
pub struct InsertBuilder<'a> {
    table: &'a Table,
    schema: Option<&'a str>,
    keys: Vec<&'a Column>,
    columns: Vec<&'a Column>,
    default_values: bool,
}

impl<'a> InsertBuilder<'a> {
    pub fn new(table: &'a Table, keys: &[&'a Column], columns: &[&'a Column]) -> Self {
        Self {
            table,
            schema: table.schema(),
            keys: keys.to_vec(),
            columns: columns.to_vec(),
            default_values: false,
        }
    }

    /// With no columns at all, emit `INSERT INTO t DEFAULT VALUES` instead
    /// of failing. Used for auto-increment rows whose only value is the key.
    pub fn default_values(mut self, allowed: bool) -> Self {
        self.default_values = allowed;
        self
    }

    /// Overrides the schema the table is qualified with.
    pub fn schema(mut self, schema: Option<&'a str>) -> Self {
        self.schema = schema;
        self
    }

    pub fn build(&self) -> BuildResult<String> {
        let count = self.keys.len() + self.columns.len();
        if count == 0 && self.default_values {
            let mut sql = String::with_capacity(48);
            sql.push_str("INSERT INTO ");
            push_table(&mut sql, self.table, self.schema);
            sql.push_str(" DEFAULT VALUES");
            debug!(
                "event=sql_build module=builder kind=insert table={} sql={}",
                self.table.name(),
                sql
            );
            return Ok(sql);
        }
        if count == 0 {
            return Err(BuildError::EmptyColumnList {
                statement: "insert",
                table: self.table.name().to_string(),
            });
        }

        let mut sql = String::with_capacity(64 + count * 24);
        sql.push_str("INSERT INTO ");
        push_table(&mut sql, self.table, self.schema);
        sql.push_str(" (");
        for (index, column) in self.keys.iter().chain(self.columns.iter()).enumerate() {
            if column.is_derived() {
                return Err(BuildError::DerivedColumn {
                    statement: "insert",
                    column: column.name().to_string(),
                });
            }
            if index > 0 {
                sql.push(',');
            }
            push_identifier(&mut sql, column.name());
        }
        sql.push_str(") VALUES (");
        for index in 0..count {
            if index > 0 {
                sql.push(',');
            }
            sql.push('?');
        }
        sql.push(')');

        debug!(
            "event=sql_build module=builder kind=insert table={} sql={}",
            self.table.name(),
            sql
        );
        Ok(sql)
    }
}

#[cfg(test)]
mod tests {
    use super::InsertBuilder;
    use crate::builder::BuildError;
    use crate::model::column::{Column, ColumnFlags};
    use crate::model::table::Table;

    #[test]
    fn keys_only_insert_is_valid() {
        let table = Table::new("tag");
        let id = Column::primary_key("tag", "id");
        let sql = InsertBuilder::new(&table, &[&id], &[]).build().unwrap();
        assert_eq!(sql, "INSERT INTO `tag` (`id`) VALUES (?)");
    }

    #[test]
    fn schema_qualifies_table() {
        let table = Table::with_schema("tag", "main");
        let id = Column::primary_key("tag", "id");
        let name = Column::single("tag", "name", ColumnFlags::default());
        let sql = InsertBuilder::new(&table, &[&id], &[&name]).build().unwrap();
        assert_eq!(sql, "INSERT INTO `main`.`tag` (`id`,`name`) VALUES (?,?)");
    }

    #[test]
    fn empty_insert_is_rejected() {
        let table = Table::new("tag");
        let err = InsertBuilder::new(&table, &[], &[]).build().unwrap_err();
        assert!(matches!(err, BuildError::EmptyColumnList { .. }));
    }

    #[test]
    fn empty_insert_may_fall_back_to_default_values() {
        let table = Table::with_schema("tag", "main");
        let sql = InsertBuilder::new(&table, &[], &[])
            .default_values(true)
            .build()
            .unwrap();
        assert_eq!(sql, "INSERT INTO `main`.`tag` DEFAULT VALUES");
    }
}
