use super::{BatchMismatch, RepoError, RepoResult};
use crate::builder::{DeleteBuilder, EntitySql, InsertBuilder, SelectBuilder, UpdateBuilder};
use crate::database::Database;
use crate::mapper::{GeneratedKey, IdSetter, MapperError, ParameterBinder, Params, RowMapper};
use crate::model::column::Column;
use crate::model::table::Table;
use crate::tx::{BatchReport, Transaction, TxError};
use log::{error, warn};
use std::fmt::Debug;

/// CRUD primitives generated repositories are written against.
///
/// Holds no transaction: every operation takes the caller's transaction
/// explicitly and reuses its statement cache.
#[derive(Clone, Copy)]
pub struct Repository<'db> {
    database: &'db Database,
}

impl<'db> Repository<'db> {
    pub fn new(database: &'db Database) -> Self {
        Self { database }
    }

    pub fn database(&self) -> &'db Database {
        self.database
    }

    /// Memoized statement set for `entity`.
    pub fn statements(&self, entity: &str) -> RepoResult<&'db EntitySql> {
        self.database.statements(entity)
    }

    pub fn select_builder<'a>(&self, table: &'a Table, columns: &[&'a Column]) -> SelectBuilder<'a>
    where
        'db: 'a,
    {
        SelectBuilder::new(table, columns).schema(self.database.schema_for(table))
    }

    pub fn insert_builder<'a>(
        &self,
        table: &'a Table,
        keys: &[&'a Column],
        columns: &[&'a Column],
    ) -> InsertBuilder<'a>
    where
        'db: 'a,
    {
        InsertBuilder::new(table, keys, columns).schema(self.database.schema_for(table))
    }

    pub fn update_builder<'a>(
        &self,
        table: &'a Table,
        columns: &[&'a Column],
        keys: &[&'a Column],
    ) -> UpdateBuilder<'a>
    where
        'db: 'a,
    {
        UpdateBuilder::new(table, columns, keys).schema(self.database.schema_for(table))
    }

    pub fn delete_builder<'a>(&self, table: &'a Table, keys: &[&'a Column]) -> DeleteBuilder<'a>
    where
        'db: 'a,
    {
        DeleteBuilder::new(table, keys).schema(self.database.schema_for(table))
    }

    /// Binds `entity`, executes the insert and requires exactly one row.
    pub fn insert<E, B>(
        &self,
        tx: &mut Transaction,
        sql: &str,
        binder: &B,
        entity: &E,
    ) -> RepoResult<()>
    where
        E: Debug + ?Sized,
        B: ParameterBinder<E> + ?Sized,
    {
        let handle = tx.insert(sql)?;
        let params = bind(sql, binder, entity)?;
        let affected = tx.execute(&handle, &params)?;
        expect_single_row(sql, affected)
    }

    /// Insert whose key is generated by the store; the key is written back
    /// onto `entity` through `id_setter` once the row is in.
    pub fn insert_auto_increment<E, B, S>(
        &self,
        tx: &mut Transaction,
        sql: &str,
        binder: &B,
        id_setter: &S,
        entity: &mut E,
    ) -> RepoResult<()>
    where
        E: Debug + ?Sized,
        B: ParameterBinder<E> + ?Sized,
        S: IdSetter<E> + ?Sized,
    {
        let handle = tx.insert(sql)?;
        let params = bind(sql, binder, &*entity)?;
        let affected = tx.execute(&handle, &params)?;
        expect_single_row(sql, affected)?;

        let key = GeneratedKey::new(tx.last_insert_rowid()?);
        id_setter
            .set_id(entity, key)
            .map_err(|source| RepoError::IdAssignment {
                sql: sql.to_string(),
                setter: id_setter.name(),
                source,
            })
    }

    pub fn update<E, B>(
        &self,
        tx: &mut Transaction,
        sql: &str,
        binder: &B,
        entity: &E,
    ) -> RepoResult<()>
    where
        E: Debug + ?Sized,
        B: ParameterBinder<E> + ?Sized,
    {
        let handle = tx.update(sql)?;
        let params = bind(sql, binder, entity)?;
        let affected = tx.execute(&handle, &params)?;
        expect_single_row(sql, affected)
    }

    pub fn delete<E, B>(
        &self,
        tx: &mut Transaction,
        sql: &str,
        binder: &B,
        entity: &E,
    ) -> RepoResult<()>
    where
        E: Debug + ?Sized,
        B: ParameterBinder<E> + ?Sized,
    {
        let handle = tx.update(sql)?;
        let params = bind(sql, binder, entity)?;
        let affected = tx.execute(&handle, &params)?;
        expect_single_row(sql, affected)
    }

    /// Maps the first row, or returns `None` for an empty result.
    pub fn select_one<A, T, B, M>(
        &self,
        tx: &mut Transaction,
        sql: &str,
        binder: &B,
        args: &A,
        mapper: &M,
    ) -> RepoResult<Option<T>>
    where
        A: Debug + ?Sized,
        B: ParameterBinder<A> + ?Sized,
        M: RowMapper<T> + ?Sized,
    {
        let handle = tx.select(sql)?;
        let params = bind(sql, binder, args)?;
        tx.query(&handle, &params, |sql, rows| -> RepoResult<Option<T>> {
            match rows.next().map_err(|err| TxError::execution(sql, err))? {
                Some(row) => mapper
                    .map_row(row)
                    .map(Some)
                    .map_err(|source| mapping_error(sql, mapper.name(), source)),
                None => Ok(None),
            }
        })
    }

    /// Maps every row in result order.
    pub fn select_list<A, T, B, M>(
        &self,
        tx: &mut Transaction,
        sql: &str,
        binder: &B,
        args: &A,
        mapper: &M,
    ) -> RepoResult<Vec<T>>
    where
        A: Debug + ?Sized,
        B: ParameterBinder<A> + ?Sized,
        M: RowMapper<T> + ?Sized,
    {
        let handle = tx.select(sql)?;
        let params = bind(sql, binder, args)?;
        tx.query(&handle, &params, |sql, rows| -> RepoResult<Vec<T>> {
            let mut items = Vec::new();
            while let Some(row) = rows.next().map_err(|err| TxError::execution(sql, err))? {
                let item = mapper
                    .map_row(row)
                    .map_err(|source| mapping_error(sql, mapper.name(), source))?;
                items.push(item);
            }
            Ok(items)
        })
    }

    /// Queues `entity` on the transaction's batch statement for `sql`.
    pub fn add_batch<E, B>(
        &self,
        tx: &mut Transaction,
        sql: &str,
        binder: &B,
        entity: &E,
    ) -> RepoResult<()>
    where
        E: Debug + ?Sized,
        B: ParameterBinder<E> + ?Sized,
    {
        let handle = tx.batch(sql)?;
        let params = bind(sql, binder, entity)?;
        tx.add_batch(&handle, params)?;
        Ok(())
    }

    /// Executes every queued batch and requires one affected row per entry.
    ///
    /// Reports the first mismatching entry of each statement.
    pub fn execute_batch(&self, tx: &mut Transaction) -> RepoResult<Vec<BatchReport>> {
        let reports = tx.execute_batch()?;

        let mismatches: Vec<BatchMismatch> = reports
            .iter()
            .filter_map(|report| {
                report
                    .row_counts
                    .iter()
                    .position(|affected| *affected != 1)
                    .map(|index| BatchMismatch {
                        sql: report.sql.clone(),
                        index,
                        actual: report.row_counts[index],
                    })
            })
            .collect();

        if !mismatches.is_empty() {
            warn!(
                "event=batch_execute module=repo status=mismatch entries={}",
                mismatches.len()
            );
            return Err(RepoError::BatchRowCount(mismatches));
        }
        Ok(reports)
    }
}

fn bind<E, B>(sql: &str, binder: &B, entity: &E) -> RepoResult<Params>
where
    E: Debug + ?Sized,
    B: ParameterBinder<E> + ?Sized,
{
    let mut params = Params::new();
    binder.bind(&mut params, entity).map_err(|source| {
        error!(
            "event=parameter_bind module=repo status=error binder={} error={}",
            binder.name(),
            source
        );
        RepoError::ParameterBinding {
            sql: sql.to_string(),
            binder: binder.name(),
            entity: format!("{entity:?}"),
            source,
        }
    })?;
    Ok(params)
}

fn mapping_error(sql: &str, mapper: &'static str, source: MapperError) -> RepoError {
    error!(
        "event=row_map module=repo status=error mapper={} error={}",
        mapper, source
    );
    RepoError::RowMapping {
        sql: sql.to_string(),
        mapper,
        source,
    }
}

fn expect_single_row(sql: &str, affected: usize) -> RepoResult<()> {
    if affected != 1 {
        warn!(
            "event=row_count module=repo status=mismatch expected=1 actual={} sql={}",
            affected, sql
        );
        return Err(RepoError::UnexpectedAffectedRowCount {
            sql: sql.to_string(),
            expected: 1,
            actual: affected,
        });
    }
    Ok(())
}
