//! Active-record driver: todo rows that know how to persist themselves.
//!
//! # Responsibility
//! - Expose `ActiveTodo` with `find`/`all`/`count_where` finders and
//!   `save`/`reload`/`destroy` instance methods over a sqlx pool.
//! - Adapt those model methods to the `StorageDriver` seam.
//!
//! # Invariants
//! - A model without `id` is a new record; `save` assigns a uuid v4 in its
//!   insert hook and inserts. A model with `id` is updated in place.
//! - Saving a model whose row has vanished fails with `RowNotFound`.

use crate::db::{open_pool, open_pool_in_memory, DbResult};
use crate::repo::driver::{DriverResult, StorageDriver};
use crate::repo::record::{RecordFilter, StoredRecord, TodoRecord};
use crate::repo::todo_repo::BackendFailure;
use async_trait::async_trait;
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

const BACKEND: &str = "active_record";

const CREATE_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS todo_records (
    id TEXT PRIMARY KEY NOT NULL,
    title TEXT NOT NULL,
    completed BOOLEAN NOT NULL DEFAULT FALSE,
    priority TEXT NOT NULL DEFAULT 'medium',
    created_at INTEGER NOT NULL,
    due_date INTEGER
)
"#;

const SELECT_SQL: &str =
    "SELECT id, title, completed, priority, created_at, due_date FROM todo_records";

/// One `todo_records` row as a self-persisting model.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ActiveTodo {
    pub id: Option<String>,
    pub title: String,
    pub completed: bool,
    pub priority: String,
    pub created_at: i64,
    pub due_date: Option<i64>,
}

impl ActiveTodo {
    /// Builds an unsaved model from a record.
    pub fn new(record: &TodoRecord) -> Self {
        Self {
            id: None,
            title: record.title.clone(),
            completed: record.completed,
            priority: record.priority.clone(),
            created_at: record.created_at,
            due_date: record.due_date,
        }
    }

    pub fn is_new_record(&self) -> bool {
        self.id.is_none()
    }

    /// Copies mutable attributes from `record`. `id` and `created_at` stay.
    pub fn assign(&mut self, record: &TodoRecord) {
        self.title.clone_from(&record.title);
        self.completed = record.completed;
        self.priority.clone_from(&record.priority);
        self.due_date = record.due_date;
    }

    pub fn to_record(&self) -> TodoRecord {
        TodoRecord {
            title: self.title.clone(),
            completed: self.completed,
            priority: self.priority.clone(),
            created_at: self.created_at,
            due_date: self.due_date,
        }
    }

    pub async fn find(pool: &SqlitePool, id: &str) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Self>(&format!("{SELECT_SQL} WHERE id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Loads models, optionally constrained on `completed`.
    pub async fn all(pool: &SqlitePool, completed: Option<bool>) -> sqlx::Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(&format!(
            "{SELECT_SQL} WHERE (?1 IS NULL OR completed = ?1) ORDER BY created_at DESC"
        ))
        .bind(completed)
        .fetch_all(pool)
        .await
    }

    pub async fn count_where(pool: &SqlitePool, completed: Option<bool>) -> sqlx::Result<i64> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM todo_records WHERE (?1 IS NULL OR completed = ?1)",
        )
        .bind(completed)
        .fetch_one(pool)
        .await
    }

    /// Inserts a new record or updates an existing one.
    pub async fn save(&mut self, pool: &SqlitePool) -> sqlx::Result<()> {
        match self.id.clone() {
            None => self.insert(pool).await,
            Some(id) => {
                let result = sqlx::query(
                    r#"
                    UPDATE todo_records
                    SET title = ?, completed = ?, priority = ?, due_date = ?
                    WHERE id = ?
                    "#,
                )
                .bind(&self.title)
                .bind(self.completed)
                .bind(&self.priority)
                .bind(self.due_date)
                .bind(id)
                .execute(pool)
                .await?;

                if result.rows_affected() == 0 {
                    return Err(sqlx::Error::RowNotFound);
                }
                Ok(())
            }
        }
    }

    /// Re-reads every attribute from the database.
    pub async fn reload(&mut self, pool: &SqlitePool) -> sqlx::Result<()> {
        let Some(id) = self.id.as_deref() else {
            return Err(sqlx::Error::RowNotFound);
        };
        *self = Self::find(pool, id).await?.ok_or(sqlx::Error::RowNotFound)?;
        Ok(())
    }

    /// Deletes this record. Returns `false` if it was already gone.
    pub async fn destroy(self, pool: &SqlitePool) -> sqlx::Result<bool> {
        let Some(id) = self.id else {
            return Ok(false);
        };
        let result = sqlx::query("DELETE FROM todo_records WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert(&mut self, pool: &SqlitePool) -> sqlx::Result<()> {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO todo_records (id, title, completed, priority, created_at, due_date)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&self.title)
        .bind(self.completed)
        .bind(&self.priority)
        .bind(self.created_at)
        .bind(self.due_date)
        .execute(pool)
        .await?;

        self.id = Some(id);
        Ok(())
    }
}

/// Adapts [`ActiveTodo`] models to the driver seam.
pub struct ActiveRecordDriver {
    pool: SqlitePool,
}

impl ActiveRecordDriver {
    pub async fn with_pool(pool: SqlitePool) -> DbResult<Self> {
        sqlx::query(CREATE_TABLE_SQL).execute(&pool).await?;
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
impl StorageDriver for ActiveRecordDriver {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    async fn insert(&self, record: &TodoRecord) -> DriverResult<String> {
        let mut model = ActiveTodo::new(record);
        model.save(&self.pool).await.map_err(backend_error)?;
        model
            .id
            .ok_or_else(|| BackendFailure::new(BACKEND, "saved record has no id"))
    }

    async fn fetch(&self, id: &str) -> DriverResult<Option<TodoRecord>> {
        let model = ActiveTodo::find(&self.pool, id)
            .await
            .map_err(backend_error)?;
        Ok(model.map(|model| model.to_record()))
    }

    async fn fetch_all(&self, filter: RecordFilter) -> DriverResult<Vec<StoredRecord>> {
        let models = ActiveTodo::all(&self.pool, filter.completed())
            .await
            .map_err(backend_error)?;

        Ok(models
            .into_iter()
            .filter_map(|model| {
                let record = model.to_record();
                model.id.map(|id| StoredRecord { id, record })
            })
            .collect())
    }

    async fn replace(&self, id: &str, record: &TodoRecord) -> DriverResult<bool> {
        let Some(mut model) = ActiveTodo::find(&self.pool, id)
            .await
            .map_err(backend_error)?
        else {
            return Ok(false);
        };

        model.assign(record);
        match model.save(&self.pool).await {
            Ok(()) => Ok(true),
            Err(sqlx::Error::RowNotFound) => Ok(false),
            Err(err) => Err(backend_error(err)),
        }
    }

    async fn remove(&self, id: &str) -> DriverResult<bool> {
        let Some(model) = ActiveTodo::find(&self.pool, id)
            .await
            .map_err(backend_error)?
        else {
            return Ok(false);
        };
        model.destroy(&self.pool).await.map_err(backend_error)
    }

    async fn count(&self, filter: RecordFilter) -> DriverResult<u64> {
        let count = ActiveTodo::count_where(&self.pool, filter.completed())
            .await
            .map_err(backend_error)?;
        u64::try_from(count).map_err(|err| BackendFailure::new(BACKEND, err))
    }
}
