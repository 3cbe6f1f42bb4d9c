//! sqlx SQLite pool bootstrap for the relational and active-record drivers.
//!
//! # Invariants
//! - In-memory pools hold exactly one connection that never expires, since
//!   every SQLite memory connection is its own database.

use super::DbResult;
use log::{error, info};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::{Duration, Instant};

/// Kept low: SQLite serializes writers anyway.
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens a pool for `database_url` (e.g. `sqlite://todos.db`), creating the
/// database file when missing.
///
/// # Side effects
/// - Emits `pool_open` logging events with duration and status.
pub async fn open_pool(database_url: &str) -> DbResult<SqlitePool> {
    let started_at = Instant::now();
    info!("event=pool_open module=db status=start mode=file");

    let options = match SqliteConnectOptions::from_str(database_url) {
        Ok(options) => options.create_if_missing(true).busy_timeout(BUSY_TIMEOUT),
        Err(err) => {
            error!(
                "event=pool_open module=db status=error mode=file duration_ms={} error_code=invalid_url error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    let result = SqlitePoolOptions::new()
        .max_connections(DEFAULT_MAX_CONNECTIONS)
        .connect_with(options)
        .await;
    log_pool_result("file", started_at, result)
}

/// Opens a single-connection in-memory pool.
pub async fn open_pool_in_memory() -> DbResult<SqlitePool> {
    let started_at = Instant::now();
    info!("event=pool_open module=db status=start mode=memory");

    let result = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(SqliteConnectOptions::new().in_memory(true))
        .await;
    log_pool_result("memory", started_at, result)
}

fn log_pool_result(
    mode: &str,
    started_at: Instant,
    result: Result<SqlitePool, sqlx::Error>,
) -> DbResult<SqlitePool> {
    match result {
        Ok(pool) => {
            info!(
                "event=pool_open module=db status=ok mode={} duration_ms={}",
                mode,
                started_at.elapsed().as_millis()
            );
            Ok(pool)
        }
        Err(err) => {
            error!(
                "event=pool_open module=db status=error mode={} duration_ms={} error_code=pool_connect_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err.into())
        }
    }
}
