//! Embedded SQL driver backed by rusqlite.
//!
//! # Responsibility
//! - Keep SQL details for the `todos` table inside this driver.
//! - Move blocking SQLite calls off the async executor.
//!
//! # Invariants
//! - The connection is opened through `db::open_db*`, so migrations are
//!   applied before the first statement runs.
//! - Ids are random uuid v4 strings generated before the insert.

use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::repo::driver::{DriverResult, StorageDriver};
use crate::repo::record::{RecordFilter, StoredRecord, TodoRecord};
use crate::repo::todo_repo::BackendFailure;
use async_trait::async_trait;
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

const BACKEND: &str = "sqlite";

const TODO_SELECT_SQL: &str = "SELECT
    id,
    title,
    completed,
    priority,
    created_at,
    due_date
FROM todos";

/// rusqlite connection shared with the blocking pool.
pub struct SqliteDriver {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDriver {
    /// Wraps an already migrated connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Ok(Self::new(open_db(path)?))
    }

    pub fn open_in_memory() -> DbResult<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }

    async fn run<T, F>(&self, operation: F) -> DriverResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| BackendFailure::new(BACKEND, "sqlite connection mutex poisoned"))?;
            operation(&guard).map_err(|err| BackendFailure::new(BACKEND, err))
        })
        .await
        .map_err(|err| BackendFailure::new(BACKEND, err))?
    }
}

#[async_trait]
impl StorageDriver for SqliteDriver {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    async fn insert(&self, record: &TodoRecord) -> DriverResult<String> {
        let record = record.clone();
        let id = Uuid::new_v4().to_string();
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO todos (
                    id,
                    title,
                    completed,
                    priority,
                    created_at,
                    due_date
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    id,
                    record.title,
                    record.completed,
                    record.priority,
                    record.created_at,
                    record.due_date,
                ],
            )?;
            Ok(id)
        })
        .await
    }

    async fn fetch(&self, id: &str) -> DriverResult<Option<TodoRecord>> {
        let id = id.to_string();
        self.run(move |conn| {
            let mut stmt = conn.prepare(&format!("{TODO_SELECT_SQL} WHERE id = ?1;"))?;
            let mut rows = stmt.query([id])?;
            if let Some(row) = rows.next()? {
                return Ok(Some(parse_todo_row(row)?.record));
            }

            Ok(None)
        })
        .await
    }

    async fn fetch_all(&self, filter: RecordFilter) -> DriverResult<Vec<StoredRecord>> {
        self.run(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "{TODO_SELECT_SQL}
                 WHERE (?1 IS NULL OR completed = ?1)
                 ORDER BY created_at DESC;"
            ))?;
            let mut rows = stmt.query(params![filter.completed()])?;
            let mut records = Vec::new();
            while let Some(row) = rows.next()? {
                records.push(parse_todo_row(row)?);
            }
            Ok(records)
        })
        .await
    }

    async fn replace(&self, id: &str, record: &TodoRecord) -> DriverResult<bool> {
        let id = id.to_string();
        let record = record.clone();
        self.run(move |conn| {
            let changed = conn.execute(
                "UPDATE todos
                 SET
                    title = ?1,
                    completed = ?2,
                    priority = ?3,
                    due_date = ?4
                 WHERE id = ?5;",
                params![
                    record.title,
                    record.completed,
                    record.priority,
                    record.due_date,
                    id,
                ],
            )?;
            Ok(changed > 0)
        })
        .await
    }

    async fn remove(&self, id: &str) -> DriverResult<bool> {
        let id = id.to_string();
        self.run(move |conn| {
            let changed = conn.execute("DELETE FROM todos WHERE id = ?1;", [id])?;
            Ok(changed > 0)
        })
        .await
    }

    async fn count(&self, filter: RecordFilter) -> DriverResult<u64> {
        let count = self
            .run(move |conn| {
                conn.query_row(
                    "SELECT COUNT(*) FROM todos WHERE (?1 IS NULL OR completed = ?1);",
                    params![filter.completed()],
                    |row| row.get::<_, i64>(0),
                )
            })
            .await?;
        u64::try_from(count).map_err(|err| BackendFailure::new(BACKEND, err))
    }
}

fn parse_todo_row(row: &Row<'_>) -> rusqlite::Result<StoredRecord> {
    Ok(StoredRecord {
        id: row.get("id")?,
        record: TodoRecord {
            title: row.get("title")?,
            completed: row.get("completed")?,
            priority: row.get("priority")?,
            created_at: row.get("created_at")?,
            due_date: row.get("due_date")?,
        },
    })
}
