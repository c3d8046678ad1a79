mod common;

use common::{count_students, create_schema};
use rowkit_core::db::open_connection;
use rowkit_core::{
    DatabaseConfig, DbError, Params, SqliteConnectionFactory, StatementRole, TransactionManager,
    TransactionMode, TransactionState, TxError,
};
use rusqlite::Connection;
use std::path::Path;

const INSERT_SQL: &str =
    "INSERT INTO `student` (`id`,`code`,`age`,`created_at`) VALUES (?,?,?,?)";
const SELECT_SQL: &str = "SELECT `code` FROM `student` WHERE `id`=?";

fn manager(path: &Path) -> TransactionManager {
    TransactionManager::new(SqliteConnectionFactory::new(DatabaseConfig::new(path)).unwrap())
}

fn student_params(id: i64) -> Params {
    let mut params = Params::new();
    params.push(&id).unwrap();
    params.push(&format!("S{id:03}")).unwrap();
    params.push(&Option::<i64>::None).unwrap();
    params.push(&0_i64).unwrap();
    params
}

#[test]
fn same_sql_and_role_returns_the_cached_handle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.db");
    create_schema(&path);
    let manager = manager(&path);

    let mut tx = manager.new_transaction_read_write().unwrap();
    let first = tx.insert(INSERT_SQL).unwrap();
    let second = tx.insert(INSERT_SQL).unwrap();
    let select = tx.select(SELECT_SQL).unwrap();

    assert_eq!(first, second);
    assert_ne!(first, select);
    assert_eq!(first.role(), StatementRole::Insert);
    assert_eq!(first.transaction(), tx.id());
    assert_eq!(tx.cached_statement_count(), 2);
}

#[test]
fn same_sql_under_another_role_is_cached_separately() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roles.db");
    create_schema(&path);
    let manager = manager(&path);

    let mut tx = manager.new_transaction_read_write().unwrap();
    let insert = tx.insert(INSERT_SQL).unwrap();
    let batch = tx.batch(INSERT_SQL).unwrap();

    assert_ne!(insert, batch);
    assert_eq!(tx.cached_statement_count(), 2);
}

#[test]
fn committed_rows_are_visible_to_a_new_transaction() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("commit.db");
    create_schema(&path);
    let manager = manager(&path);

    let mut tx = manager.new_transaction_read_write().unwrap();
    let handle = tx.insert(INSERT_SQL).unwrap();
    assert_eq!(tx.execute(&handle, &student_params(1)).unwrap(), 1);
    tx.commit().unwrap();
    assert_eq!(tx.state(), TransactionState::Committed);

    let mut reader = manager.new_transaction_read_only().unwrap();
    let select = reader.select(SELECT_SQL).unwrap();
    let mut params = Params::new();
    params.push(&1_i64).unwrap();
    let code: Option<String> = reader
        .query(&select, &params, |_, rows| -> Result<_, TxError> {
            let row = rows.next().unwrap();
            Ok(row.map(|row| row.get(0).unwrap()))
        })
        .unwrap();
    assert_eq!(code.as_deref(), Some("S001"));
}

#[test]
fn every_call_fails_after_commit() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("closed.db");
    create_schema(&path);
    let manager = manager(&path);

    let mut tx = manager.new_transaction_read_write().unwrap();
    let handle = tx.insert(INSERT_SQL).unwrap();
    tx.commit().unwrap();

    assert!(matches!(
        tx.execute(&handle, &student_params(1)),
        Err(TxError::Closed {
            state: TransactionState::Committed,
            ..
        })
    ));
    assert!(matches!(tx.insert(INSERT_SQL), Err(TxError::Closed { .. })));
    assert!(matches!(tx.commit(), Err(TxError::Closed { .. })));
    assert!(matches!(tx.rollback(), Err(TxError::Closed { .. })));
    assert_eq!(tx.cached_statement_count(), 0);
    tx.close().unwrap();
    assert_eq!(tx.state(), TransactionState::Committed);
}

#[test]
fn rollback_discards_writes_and_closes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rollback.db");
    create_schema(&path);
    let manager = manager(&path);

    let mut tx = manager.new_transaction_read_write().unwrap();
    let handle = tx.insert(INSERT_SQL).unwrap();
    tx.execute(&handle, &student_params(7)).unwrap();
    tx.rollback().unwrap();

    assert_eq!(tx.state(), TransactionState::RolledBack);
    assert!(matches!(tx.select(SELECT_SQL), Err(TxError::Closed { .. })));
    assert_eq!(count_students(&path), 0);
}

#[test]
fn dropping_an_active_transaction_rolls_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("drop.db");
    create_schema(&path);
    let manager = manager(&path);

    {
        let mut tx = manager.new_transaction_read_write().unwrap();
        let handle = tx.insert(INSERT_SQL).unwrap();
        tx.execute(&handle, &student_params(3)).unwrap();
    }

    assert_eq!(count_students(&path), 0);
    let tx = manager.new_transaction_read_write().unwrap();
    assert!(tx.is_active());
}

#[test]
fn read_only_transaction_rejects_write_roles() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("readonly.db");
    create_schema(&path);
    let manager = manager(&path);

    let mut tx = manager.new_transaction_read_only().unwrap();
    assert_eq!(tx.mode(), TransactionMode::ReadOnly);
    assert!(matches!(tx.insert(INSERT_SQL), Err(TxError::ReadOnly { .. })));
    assert!(matches!(tx.batch(INSERT_SQL), Err(TxError::ReadOnly { .. })));
    assert!(tx.select(SELECT_SQL).is_ok());
}

#[test]
fn handle_from_another_transaction_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("foreign.db");
    create_schema(&path);
    let manager = manager(&path);

    let mut first = manager.new_transaction_read_only().unwrap();
    let foreign = first.select(SELECT_SQL).unwrap();
    first.close().unwrap();
    assert_eq!(first.state(), TransactionState::Closed);

    let mut second = manager.new_transaction_read_only().unwrap();
    second.select(SELECT_SQL).unwrap();
    let err = second
        .query(&foreign, &Params::new(), |_, _| -> Result<(), TxError> { Ok(()) })
        .unwrap_err();
    assert!(matches!(err, TxError::ForeignHandle { .. }));
}

#[test]
fn execute_rejects_select_handles() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("role.db");
    create_schema(&path);
    let manager = manager(&path);

    let mut tx = manager.new_transaction_read_write().unwrap();
    let select = tx.select(SELECT_SQL).unwrap();
    let err = tx.execute(&select, &Params::new()).unwrap_err();
    assert!(matches!(
        err,
        TxError::NotExecutable {
            role: StatementRole::Select,
            ..
        }
    ));
    assert!(!err.to_string().contains("used as"));

    let batch = tx.batch(INSERT_SQL).unwrap();
    let err = tx.execute(&batch, &student_params(1)).unwrap_err();
    match err {
        TxError::NotExecutable { sql, role } => {
            assert_eq!(sql, INSERT_SQL);
            assert_eq!(role, StatementRole::Batch);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn invalid_sql_surfaces_as_execution_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("invalid.db");
    create_schema(&path);
    let manager = manager(&path);

    let mut tx = manager.new_transaction_read_write().unwrap();
    let err = tx.insert("INSERT INTO `missing` (`id`) VALUES (?)").unwrap_err();
    match err {
        TxError::Execution { sql, .. } => assert!(sql.contains("`missing`")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn batch_executes_in_registration_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("batch.db");
    create_schema(&path);
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE audit (seq INTEGER PRIMARY KEY AUTOINCREMENT, student_id INTEGER NOT NULL);",
    )
    .unwrap();
    drop(conn);
    let manager = manager(&path);

    let mut tx = manager.new_transaction_read_write().unwrap();
    let students = tx.batch(INSERT_SQL).unwrap();
    let audit = tx.batch("INSERT INTO `audit` (`student_id`) VALUES (?)").unwrap();
    for id in 0..10_i64 {
        tx.add_batch(&students, student_params(id)).unwrap();
        let mut params = Params::new();
        params.push(&id).unwrap();
        tx.add_batch(&audit, params).unwrap();
    }
    assert_eq!(tx.pending_batch_count(), 20);

    let reports = tx.execute_batch().unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].sql, INSERT_SQL);
    assert_eq!(reports[0].row_counts, vec![1; 10]);
    assert_eq!(reports[1].row_counts.len(), 10);
    assert_eq!(tx.pending_batch_count(), 0);
    tx.commit().unwrap();

    let conn = Connection::open(&path).unwrap();
    let mut stmt = conn
        .prepare("SELECT student_id FROM audit ORDER BY seq")
        .unwrap();
    let order: Vec<i64> = stmt
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(order, (0..10).collect::<Vec<_>>());
    assert_eq!(count_students(&path), 10);
}

#[test]
fn pending_batches_are_discarded_when_the_transaction_ends() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("discard.db");
    create_schema(&path);
    let manager = manager(&path);

    let mut tx = manager.new_transaction_read_write().unwrap();
    let batch = tx.batch(INSERT_SQL).unwrap();
    tx.add_batch(&batch, student_params(1)).unwrap();
    tx.commit().unwrap();

    assert_eq!(tx.pending_batch_count(), 0);
    assert_eq!(count_students(&path), 0);
}

#[test]
fn failed_commit_rolls_back_and_ends_the_transaction() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deferred.db");
    create_schema(&path);
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE enrollment (
            student_id INTEGER NOT NULL
                REFERENCES student(id) DEFERRABLE INITIALLY DEFERRED
        );",
    )
    .unwrap();
    drop(conn);
    let manager = manager(&path);

    let mut tx = manager.new_transaction_read_write().unwrap();
    let insert = tx.insert(INSERT_SQL).unwrap();
    tx.execute(&insert, &student_params(1)).unwrap();
    let orphan = tx
        .insert("INSERT INTO `enrollment` (`student_id`) VALUES (?)")
        .unwrap();
    let mut params = Params::new();
    params.push(&99_i64).unwrap();
    tx.execute(&orphan, &params).unwrap();

    let err = tx.commit().unwrap_err();

    assert!(matches!(err, TxError::Commit(_)));
    assert_eq!(tx.state(), TransactionState::RolledBack);
    assert_eq!(tx.cached_statement_count(), 0);
    assert!(matches!(tx.commit(), Err(TxError::Closed { .. })));
    assert_eq!(count_students(&path), 0);
    let conn = Connection::open(&path).unwrap();
    let enrolled: i64 = conn
        .query_row("SELECT COUNT(*) FROM enrollment", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enrolled, 0);
}

#[test]
fn in_transaction_commits_on_ok_and_rolls_back_on_err() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scoped.db");
    create_schema(&path);
    let manager = manager(&path);

    manager
        .in_transaction(|tx| -> Result<(), TxError> {
            let handle = tx.insert(INSERT_SQL)?;
            tx.execute(&handle, &student_params(1))?;
            Ok(())
        })
        .unwrap();

    let err = manager
        .in_transaction(|tx| -> Result<(), TxError> {
            let handle = tx.insert(INSERT_SQL)?;
            tx.execute(&handle, &student_params(2))?;
            tx.execute(&handle, &student_params(2))?;
            Ok(())
        })
        .unwrap_err();

    assert!(matches!(err, TxError::Execution { .. }));
    assert_eq!(count_students(&path), 1);
}

#[test]
fn closure_factories_are_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("closure.db");
    create_schema(&path);
    let config = DatabaseConfig::new(&path);

    let manager = TransactionManager::new(move || open_connection(&config));
    let mut tx = manager.new_transaction_read_write().unwrap();
    tx.select(SELECT_SQL).unwrap();
    tx.commit().unwrap();
}

#[test]
fn connection_failures_surface_as_db_errors() {
    let manager = TransactionManager::new(|| -> Result<Connection, DbError> {
        Err(DbError::InvalidConfig("unreachable".to_string()))
    });

    let err = manager.new_transaction_read_write().unwrap_err();
    assert!(matches!(err, TxError::Db(DbError::InvalidConfig(_))));
}
