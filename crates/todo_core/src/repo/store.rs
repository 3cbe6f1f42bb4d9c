//! Generic todo repository over any [`StorageDriver`].
//!
//! # Responsibility
//! - Implement `TodoRepository` once for every backend.
//! - Own validation, record mapping, patch merging, absence mapping and
//!   newest-first ordering so drivers stay engine-specific glue.
//!
//! # Invariants
//! - Writes validate the todo before any driver call.
//! - Reads revalidate persisted state instead of masking it.
//! - Every contract call emits exactly one metadata-only `todo_*` log
//!   event; titles are never logged.

use crate::model::identity::{Identity, ValidatorRegistry};
use crate::model::patch::TodoPatch;
use crate::model::todo::Todo;
use crate::repo::driver::StorageDriver;
use crate::repo::record::{RecordFilter, StoredRecord, TodoRecord};
use crate::repo::todo_repo::{RepoError, RepoResult, TodoRepository};
use crate::specification::Specification;
use async_trait::async_trait;
use log::{debug, error, warn};
use std::sync::Arc;
use std::time::Instant;

/// `TodoRepository` implementation shared by all storage drivers.
pub struct TodoStore<D> {
    driver: D,
    registry: Arc<ValidatorRegistry>,
}

impl<D: StorageDriver> TodoStore<D> {
    pub fn new(driver: D, registry: Arc<ValidatorRegistry>) -> Self {
        Self { driver, registry }
    }

    /// Uses the built-in uuid/object_id validators.
    pub fn with_default_validators(driver: D) -> Self {
        Self::new(driver, Arc::new(ValidatorRegistry::with_defaults()))
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn registry(&self) -> &ValidatorRegistry {
        &self.registry
    }

    fn hydrate(&self, id: &str, record: TodoRecord) -> RepoResult<Todo> {
        Ok(record.into_todo(id, &self.registry)?)
    }

    async fn list(&self, filter: RecordFilter) -> RepoResult<Vec<Todo>> {
        let stored = self.driver.fetch_all(filter).await?;
        let mut todos = self.hydrate_all(stored)?;
        sort_newest_first(&mut todos);
        Ok(todos)
    }

    fn hydrate_all(&self, stored: Vec<StoredRecord>) -> RepoResult<Vec<Todo>> {
        stored
            .into_iter()
            .map(|StoredRecord { id, record }| self.hydrate(&id, record))
            .collect()
    }

    async fn insert_todo(&self, todo: &Todo) -> RepoResult<Identity> {
        todo.validate()?;
        let raw_id = self.driver.insert(&TodoRecord::from_todo(todo)).await?;
        Ok(self.registry.identity(&raw_id)?)
    }

    async fn fetch_todo(&self, id: &Identity) -> RepoResult<Option<Todo>> {
        match self.driver.fetch(id.as_str()).await? {
            Some(record) => Ok(Some(self.hydrate(id.as_str(), record)?)),
            None => Ok(None),
        }
    }

    async fn patch_todo(&self, id: &Identity, changes: &TodoPatch) -> RepoResult<()> {
        let Some(record) = self.driver.fetch(id.as_str()).await? else {
            return Err(RepoError::NotFound(id.clone()));
        };
        let current = self.hydrate(id.as_str(), record)?;
        let updated = current.apply(changes)?;

        // A delete racing between fetch and replace also lands here.
        if !self
            .driver
            .replace(id.as_str(), &TodoRecord::from_todo(&updated))
            .await?
        {
            return Err(RepoError::NotFound(id.clone()));
        }
        Ok(())
    }

    async fn remove_todo(&self, id: &Identity) -> RepoResult<()> {
        if !self.driver.remove(id.as_str()).await? {
            return Err(RepoError::NotFound(id.clone()));
        }
        Ok(())
    }

    async fn count_matching(&self, filter: RecordFilter) -> RepoResult<u64> {
        Ok(self.driver.count(filter).await?)
    }

    async fn find_matching(&self, spec: &dyn Specification<Todo>) -> RepoResult<Vec<Todo>> {
        let stored = self.driver.fetch_all(RecordFilter::All).await?;
        let mut matches = self
            .hydrate_all(stored)?
            .into_iter()
            .filter(|todo| spec.is_satisfied_by(todo))
            .collect::<Vec<_>>();
        sort_newest_first(&mut matches);
        Ok(matches)
    }

    fn log_outcome<T>(&self, event: &str, started_at: Instant, result: &RepoResult<T>) {
        let duration_ms = started_at.elapsed().as_millis();
        let backend = self.driver.backend();
        match result {
            Ok(_) => debug!(
                "event={event} module=repo backend={backend} status=ok duration_ms={duration_ms}"
            ),
            Err(RepoError::Backend(err)) => error!(
                "event={event} module=repo backend={backend} status=error duration_ms={duration_ms} error_code=backend_failure error={err}"
            ),
            Err(err) => warn!(
                "event={event} module=repo backend={backend} status=error duration_ms={duration_ms} error_code={}",
                err.code()
            ),
        }
    }
}

/// Sorts by `created_at` descending; ties keep driver order.
fn sort_newest_first(todos: &mut [Todo]) {
    todos.sort_by(|left, right| right.created_at().cmp(&left.created_at()));
}

#[async_trait]
impl<D: StorageDriver> TodoRepository for TodoStore<D> {
    async fn create(&self, todo: &Todo) -> RepoResult<Identity> {
        let started_at = Instant::now();
        let result = self.insert_todo(todo).await;
        self.log_outcome("todo_create", started_at, &result);
        result
    }

    async fn get_by_id(&self, id: &Identity) -> RepoResult<Option<Todo>> {
        let started_at = Instant::now();
        let result = self.fetch_todo(id).await;
        self.log_outcome("todo_get", started_at, &result);
        result
    }

    async fn get_all(&self) -> RepoResult<Vec<Todo>> {
        let started_at = Instant::now();
        let result = self.list(RecordFilter::All).await;
        self.log_outcome("todo_list", started_at, &result);
        result
    }

    async fn get_active(&self) -> RepoResult<Vec<Todo>> {
        let started_at = Instant::now();
        let result = self.list(RecordFilter::Active).await;
        self.log_outcome("todo_list_active", started_at, &result);
        result
    }

    async fn get_completed(&self) -> RepoResult<Vec<Todo>> {
        let started_at = Instant::now();
        let result = self.list(RecordFilter::Completed).await;
        self.log_outcome("todo_list_completed", started_at, &result);
        result
    }

    async fn update(&self, id: &Identity, changes: &TodoPatch) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = self.patch_todo(id, changes).await;
        self.log_outcome("todo_update", started_at, &result);
        result
    }

    async fn delete(&self, id: &Identity) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = self.remove_todo(id).await;
        self.log_outcome("todo_delete", started_at, &result);
        result
    }

    async fn count(&self) -> RepoResult<u64> {
        let started_at = Instant::now();
        let result = self.count_matching(RecordFilter::All).await;
        self.log_outcome("todo_count", started_at, &result);
        result
    }

    async fn count_active(&self) -> RepoResult<u64> {
        let started_at = Instant::now();
        let result = self.count_matching(RecordFilter::Active).await;
        self.log_outcome("todo_count_active", started_at, &result);
        result
    }

    async fn count_completed(&self) -> RepoResult<u64> {
        let started_at = Instant::now();
        let result = self.count_matching(RecordFilter::Completed).await;
        self.log_outcome("todo_count_completed", started_at, &result);
        result
    }

    async fn find_by_specification(
        &self,
        spec: &dyn Specification<Todo>,
    ) -> RepoResult<Vec<Todo>> {
        let started_at = Instant::now();
        let result = self.find_matching(spec).await;
        self.log_outcome("todo_find", started_at, &result);
        result
    }
}
