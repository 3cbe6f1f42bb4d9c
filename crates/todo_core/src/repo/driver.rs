//! Storage driver seam.
//!
//! A driver only moves flat records in and out of one engine and allocates
//! that engine's native ids. Validation, ordering, patch merging and
//! not-found mapping belong to `TodoStore`.

use crate::repo::record::{RecordFilter, StoredRecord, TodoRecord};
use crate::repo::todo_repo::BackendFailure;
use async_trait::async_trait;

pub type DriverResult<T> = Result<T, BackendFailure>;

#[async_trait]
pub trait StorageDriver: Send + Sync {
    /// Short backend tag used in errors and log events.
    fn backend(&self) -> &'static str;

    /// Stores a new record and returns the id the engine allocated for it.
    async fn insert(&self, record: &TodoRecord) -> DriverResult<String>;

    async fn fetch(&self, id: &str) -> DriverResult<Option<TodoRecord>>;

    /// Returns matching records in no guaranteed order.
    async fn fetch_all(&self, filter: RecordFilter) -> DriverResult<Vec<StoredRecord>>;

    /// Overwrites the record stored under `id`. Returns `false` when absent.
    async fn replace(&self, id: &str, record: &TodoRecord) -> DriverResult<bool>;

    /// Removes the record stored under `id`. Returns `false` when absent.
    async fn remove(&self, id: &str) -> DriverResult<bool>;

    async fn count(&self, filter: RecordFilter) -> DriverResult<u64>;
}
