use super::cache::{StatementCache, StatementHandle, StatementRole};
use super::{TransactionId, TxError, TxResult};
use crate::mapper::Params;
use log::{debug, error, warn};
use rusqlite::{params_from_iter, Connection, Rows};
use std::fmt::{Display, Formatter};
use std::time::Instant;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionMode {
    ReadWrite,
    ReadOnly,
}

impl TransactionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ReadWrite => "read_write",
            Self::ReadOnly => "read_only",
        }
    }
}

/// Lifecycle state; every state but `Active` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Active,
    Committed,
    RolledBack,
    /// Ended by `close()` or scope exit without commit (rolled back).
    Closed,
}

impl TransactionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Committed => "committed",
            Self::RolledBack => "rolled_back",
            Self::Closed => "closed",
        }
    }
}

impl Display for TransactionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one batch statement in [`Transaction::execute_batch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub sql: String,
    /// Affected rows per parameter set, in registration order.
    pub row_counts: Vec<usize>,
}

/// One unit of work owning one live connection.
///
/// Statements are cached per (role, SQL text) for the transaction lifetime.
/// `commit`, `rollback`, `close` and drop all release the cache and the
/// connection; dropping without commit rolls back.
#[derive(Debug)]
pub struct Transaction {
    id: TransactionId,
    mode: TransactionMode,
    state: TransactionState,
    conn: Option<Connection>,
    statements: StatementCache,
    started_at: Instant,
}

impl Transaction {
    pub(crate) fn begin(conn: Connection, mode: TransactionMode) -> TxResult<Self> {
        let begin_sql = match mode {
            TransactionMode::ReadWrite => "BEGIN IMMEDIATE;",
            TransactionMode::ReadOnly => "PRAGMA query_only = ON; BEGIN DEFERRED;",
        };
        if let Err(err) = conn.execute_batch(begin_sql) {
            error!(
                "event=tx_begin module=tx status=error mode={} error={}",
                mode.as_str(),
                err
            );
            return Err(TxError::Begin(err));
        }

        let id = Uuid::new_v4();
        debug!(
            "event=tx_begin module=tx status=ok tx={} mode={}",
            id,
            mode.as_str()
        );
        Ok(Self {
            id,
            mode,
            state: TransactionState::Active,
            conn: Some(conn),
            statements: StatementCache::default(),
            started_at: Instant::now(),
        })
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn mode(&self) -> TransactionMode {
        self.mode
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == TransactionState::Active
    }

    /// Number of distinct (role, SQL) statements cached so far.
    pub fn cached_statement_count(&self) -> usize {
        self.statements.len()
    }

    /// Parameter sets waiting for [`Self::execute_batch`].
    pub fn pending_batch_count(&self) -> usize {
        self.statements.pending_batch_count()
    }

    pub fn select(&mut self, sql: &str) -> TxResult<StatementHandle> {
        self.register(StatementRole::Select, sql)
    }

    pub fn insert(&mut self, sql: &str) -> TxResult<StatementHandle> {
        self.register(StatementRole::Insert, sql)
    }

    pub fn update(&mut self, sql: &str) -> TxResult<StatementHandle> {
        self.register(StatementRole::Update, sql)
    }

    pub fn batch(&mut self, sql: &str) -> TxResult<StatementHandle> {
        self.register(StatementRole::Batch, sql)
    }

    /// Executes an insert/update-role statement, returning affected rows.
    pub fn execute(&self, handle: &StatementHandle, params: &Params) -> TxResult<usize> {
        let (conn, role, sql) = self.resolve(handle)?;
        if !matches!(role, StatementRole::Insert | StatementRole::Update) {
            return Err(TxError::NotExecutable {
                sql: sql.to_string(),
                role,
            });
        }

        let mut stmt = conn
            .prepare_cached(sql)
            .map_err(|err| TxError::execution(sql, err))?;
        let affected = stmt
            .execute(params_from_iter(params.values()))
            .map_err(|err| TxError::execution(sql, err))?;
        Ok(affected)
    }

    /// Runs a select-role statement and hands the row cursor to `read`.
    pub fn query<T, E, F>(&self, handle: &StatementHandle, params: &Params, read: F) -> Result<T, E>
    where
        F: FnOnce(&str, &mut Rows<'_>) -> Result<T, E>,
        E: From<TxError>,
    {
        let (conn, role, sql) = self.resolve(handle)?;
        if role != StatementRole::Select {
            return Err(TxError::RoleMismatch {
                sql: sql.to_string(),
                expected: StatementRole::Select,
                actual: role,
            }
            .into());
        }

        let mut stmt = conn
            .prepare_cached(sql)
            .map_err(|err| TxError::execution(sql, err))?;
        let mut rows = stmt
            .query(params_from_iter(params.values()))
            .map_err(|err| TxError::execution(sql, err))?;
        read(sql, &mut rows)
    }

    /// Queues `params` on a batch-role statement without executing it.
    pub fn add_batch(&mut self, handle: &StatementHandle, params: Params) -> TxResult<()> {
        self.ensure_active()?;
        self.ensure_owned(handle)?;

        let entry = self
            .statements
            .get_mut(handle.slot)
            .ok_or(TxError::UnknownHandle { slot: handle.slot })?;
        if entry.role != StatementRole::Batch {
            return Err(TxError::RoleMismatch {
                sql: entry.sql.clone(),
                expected: StatementRole::Batch,
                actual: entry.role,
            });
        }
        entry.pending.push(params);
        Ok(())
    }

    /// Executes every queued batch set.
    ///
    /// Statements run in first-registration order, parameter sets in the
    /// order they were added. Queues are drained up front, so a failure
    /// discards whatever had not executed yet.
    pub fn execute_batch(&mut self) -> TxResult<Vec<BatchReport>> {
        self.ensure_active()?;
        let batches = self.statements.take_batches();
        let conn = self.ensure_active()?;

        let mut reports = Vec::with_capacity(batches.len());
        for (sql, sets) in batches {
            let mut stmt = conn
                .prepare_cached(&sql)
                .map_err(|err| TxError::execution(&sql, err))?;
            let mut row_counts = Vec::with_capacity(sets.len());
            for params in &sets {
                let affected = stmt
                    .execute(params_from_iter(params.values()))
                    .map_err(|err| TxError::execution(&sql, err))?;
                row_counts.push(affected);
            }
            drop(stmt);

            debug!(
                "event=batch_execute module=tx status=ok tx={} sets={} sql={}",
                self.id,
                row_counts.len(),
                sql
            );
            reports.push(BatchReport { sql, row_counts });
        }
        Ok(reports)
    }

    /// Row id generated by the most recent successful insert.
    pub fn last_insert_rowid(&self) -> TxResult<i64> {
        Ok(self.ensure_active()?.last_insert_rowid())
    }

    /// Commits and releases the connection.
    ///
    /// A failed COMMIT is followed by a rollback; the transaction ends either way.
    pub fn commit(&mut self) -> TxResult<()> {
        let conn = self.ensure_active()?;
        if let Err(err) = conn.execute_batch("COMMIT;") {
            error!(
                "event=tx_commit module=tx status=error tx={} error={}",
                self.id, err
            );
            if let Err(rollback_err) = conn.execute_batch("ROLLBACK;") {
                error!(
                    "event=tx_rollback module=tx status=error tx={} error={}",
                    self.id, rollback_err
                );
            }
            self.release(TransactionState::RolledBack);
            return Err(TxError::Commit(err));
        }

        self.release(TransactionState::Committed);
        Ok(())
    }

    /// Rolls back and releases the connection.
    pub fn rollback(&mut self) -> TxResult<()> {
        let result = self.ensure_active()?.execute_batch("ROLLBACK;");
        self.release(TransactionState::RolledBack);
        result.map_err(TxError::Rollback)
    }

    /// Ends the transaction, rolling back when still active.
    ///
    /// A no-op on an already ended transaction.
    pub fn close(&mut self) -> TxResult<()> {
        if !self.is_active() {
            return Ok(());
        }
        let result = self.ensure_active()?.execute_batch("ROLLBACK;");
        self.release(TransactionState::Closed);
        result.map_err(TxError::Rollback)
    }

    fn register(&mut self, role: StatementRole, sql: &str) -> TxResult<StatementHandle> {
        let conn = self.ensure_active()?;
        if role.is_write() && self.mode == TransactionMode::ReadOnly {
            return Err(TxError::ReadOnly {
                sql: sql.to_string(),
            });
        }

        if self.statements.lookup(role, sql).is_none() {
            conn.prepare_cached(sql)
                .map_err(|err| TxError::execution(sql, err))?;
            debug!(
                "event=stmt_prepare module=tx tx={} role={} sql={}",
                self.id,
                role.as_str(),
                sql
            );
        }

        let slot = self.statements.register(role, sql);
        Ok(StatementHandle {
            transaction: self.id,
            role,
            slot,
        })
    }

    fn ensure_active(&self) -> TxResult<&Connection> {
        match (self.state, self.conn.as_ref()) {
            (TransactionState::Active, Some(conn)) => Ok(conn),
            _ => Err(TxError::Closed {
                id: self.id,
                state: self.state,
            }),
        }
    }

    fn ensure_owned(&self, handle: &StatementHandle) -> TxResult<()> {
        if handle.transaction != self.id {
            return Err(TxError::ForeignHandle {
                expected: self.id,
                actual: handle.transaction,
            });
        }
        Ok(())
    }

    fn resolve(&self, handle: &StatementHandle) -> TxResult<(&Connection, StatementRole, &str)> {
        let conn = self.ensure_active()?;
        self.ensure_owned(handle)?;
        let entry = self
            .statements
            .get(handle.slot)
            .ok_or(TxError::UnknownHandle { slot: handle.slot })?;
        Ok((conn, entry.role, entry.sql.as_str()))
    }

    fn release(&mut self, state: TransactionState) {
        self.state = state;
        let released = self.statements.clear();
        if let Some(conn) = self.conn.take() {
            conn.flush_prepared_statement_cache();
            if let Err((_, err)) = conn.close() {
                warn!(
                    "event=tx_release module=tx status=error tx={} error={}",
                    self.id, err
                );
            }
        }
        debug!(
            "event=tx_end module=tx status={} tx={} statements_released={} duration_ms={}",
            state,
            self.id,
            released,
            self.started_at.elapsed().as_millis()
        );
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if self.is_active() {
            warn!(
                "event=tx_scope_exit module=tx status=rollback tx={}",
                self.id
            );
            if let Err(err) = self.close() {
                error!(
                    "event=tx_scope_exit module=tx status=error tx={} error={}",
                    self.id, err
                );
            }
        }
    }
}
