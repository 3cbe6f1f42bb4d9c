//! Relational driver backed by a sqlx SQLite pool.
//!
//! # Invariants
//! - Ids are produced by the `id` column default, never by the client, and
//!   read back with `RETURNING id` in the same statement.
//! - Rows are mapped through `FromRow`; no hand-indexed columns.

use crate::db::{open_pool, open_pool_in_memory, DbResult};
use crate::repo::driver::{DriverResult, StorageDriver};
use crate::repo::record::{RecordFilter, StoredRecord, TodoRecord};
use crate::repo::todo_repo::BackendFailure;
use async_trait::async_trait;
use sqlx::{FromRow, SqlitePool};

const BACKEND: &str = "relational";

/// Random uuid v4 in canonical lowercase form, computed by SQLite.
const CREATE_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS todos (
    id TEXT PRIMARY KEY NOT NULL DEFAULT (
        lower(hex(randomblob(4))) || '-' ||
        lower(hex(randomblob(2))) || '-4' ||
        substr(lower(hex(randomblob(2))), 2) || '-' ||
        substr('89ab', 1 + (random() & 3), 1) ||
        substr(lower(hex(randomblob(2))), 2) || '-' ||
        lower(hex(randomblob(6)))
    ),
    title TEXT NOT NULL,
    completed BOOLEAN NOT NULL DEFAULT FALSE,
    priority TEXT NOT NULL DEFAULT 'medium',
    created_at INTEGER NOT NULL,
    due_date INTEGER
)
"#;

const CREATE_INDEX_SQL: &str =
    "CREATE INDEX IF NOT EXISTS idx_todos_created_at ON todos (created_at DESC)";

#[derive(Debug, Clone, FromRow)]
struct TodoRow {
    id: String,
    title: String,
    completed: bool,
    priority: String,
    created_at: i64,
    due_date: Option<i64>,
}

impl From<TodoRow> for StoredRecord {
    fn from(row: TodoRow) -> Self {
        Self {
            id: row.id,
            record: TodoRecord {
                title: row.title,
                completed: row.completed,
                priority: row.priority,
                created_at: row.created_at,
                due_date: row.due_date,
            },
        }
    }
}

pub struct RelationalDriver {
    pool: SqlitePool,
}

impl RelationalDriver {
    /// Uses `pool` after making sure the `todos` table exists.
    pub async fn with_pool(pool: SqlitePool) -> DbResult<Self> {
        sqlx::query(CREATE_TABLE_SQL).execute(&pool).await?;
        sqlx::query(CREATE_INDEX_SQL).execute(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn connect(database_url: &str) -> DbResult<Self> {
        Self::with_pool(open_pool(database_url).await?).await
    }

    pub async fn in_memory() -> DbResult<Self> {
        Self::with_pool(open_pool_in_memory().await?).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn backend_error(err: sqlx::Error) -> BackendFailure {
    BackendFailure::new(BACKEND, err)
}

#[async_trait]
impl StorageDriver for RelationalDriver {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    async fn insert(&self, record: &TodoRecord) -> DriverResult<String> {
        sqlx::query_scalar::<_, String>(
            r#"
            INSERT INTO todos (title, completed, priority, created_at, due_date)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&record.title)
        .bind(record.completed)
        .bind(&record.priority)
        .bind(record.created_at)
        .bind(record.due_date)
        .fetch_one(&self.pool)
        .await
        .map_err(backend_error)
    }

    async fn fetch(&self, id: &str) -> DriverResult<Option<TodoRecord>> {
        let row = sqlx::query_as::<_, TodoRow>(
            "SELECT id, title, completed, priority, created_at, due_date FROM todos WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend_error)?;

        Ok(row.map(|row| StoredRecord::from(row).record))
    }

    async fn fetch_all(&self, filter: RecordFilter) -> DriverResult<Vec<StoredRecord>> {
        let rows = sqlx::query_as::<_, TodoRow>(
            r#"
            SELECT id, title, completed, priority, created_at, due_date
            FROM todos
            WHERE (?1 IS NULL OR completed = ?1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filter.completed())
        .fetch_all(&self.pool)
        .await
        .map_err(backend_error)?;

        Ok(rows.into_iter().map(StoredRecord::from).collect())
    }

    async fn replace(&self, id: &str, record: &TodoRecord) -> DriverResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE todos
            SET title = ?, completed = ?, priority = ?, due_date = ?
            WHERE id = ?
            "#,
        )
        .bind(&record.title)
        .bind(record.completed)
        .bind(&record.priority)
        .bind(record.due_date)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(backend_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove(&self, id: &str) -> DriverResult<bool> {
        let result = sqlx::query("DELETE FROM todos WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(backend_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self, filter: RecordFilter) -> DriverResult<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM todos WHERE (?1 IS NULL OR completed = ?1)")
                .bind(filter.completed())
                .fetch_one(&self.pool)
                .await
                .map_err(backend_error)?;

        u64::try_from(count).map_err(|err| BackendFailure::new(BACKEND, err))
    }
}
