//! Connection bootstrap utilities for SQLite.
//!
//! # Invariants
//! - Returned connections honor `busy_timeout_ms`, `foreign_keys` and the
//!   prepared statement cache capacity from [`DatabaseConfig`].

use super::DbResult;
use crate::config::DatabaseConfig;
use log::{error, info};
use rusqlite::Connection;
use std::time::{Duration, Instant};

/// Opens the configured SQLite database file and applies connection pragmas.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_connection(config: &DatabaseConfig) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start");

    let conn = match Connection::open(&config.path) {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    match bootstrap_connection(&conn, config) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error duration_ms={} error_code=db_bootstrap_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn bootstrap_connection(conn: &Connection, config: &DatabaseConfig) -> DbResult<()> {
    let foreign_keys = if config.foreign_keys { "ON" } else { "OFF" };
    conn.execute_batch(&format!("PRAGMA foreign_keys = {foreign_keys};"))?;
    conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
    conn.set_prepared_statement_cache_capacity(config.statement_cache_capacity);
    Ok(())
}
