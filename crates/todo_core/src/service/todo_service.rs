//! Todo use-case service.
//!
//! # Responsibility
//! - Offer intent-level entry points (add, complete, rename...) on top of
//!   the repository contract.
//!
//! # Invariants
//! - Every write goes through `TodoRepository`, so validation and error
//!   mapping are identical to direct repository use.
//! - The service never knows which backend is active.

use crate::model::identity::Identity;
use crate::model::patch::TodoPatch;
use crate::model::todo::{Priority, Todo};
use crate::repo::todo_repo::{RepoResult, TodoRepository};
use crate::specification::todo::IsOverdue;
use crate::specification::Specification;

/// Input for [`TodoService::add_todo`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTodo {
    pub title: String,
    pub priority: Priority,
    /// Epoch milliseconds.
    pub due_date: Option<i64>,
}

impl NewTodo {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            priority: Priority::default(),
            due_date: None,
        }
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn due_date(mut self, due_date: i64) -> Self {
        self.due_date = Some(due_date);
        self
    }
}

pub struct TodoService<R: TodoRepository> {
    repo: R,
}

impl<R: TodoRepository> TodoService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Builds a todo created now and persists it.
    pub async fn add_todo(&self, request: NewTodo) -> RepoResult<Identity> {
        let todo = Todo::builder(request.title)
            .priority(request.priority)
            .due_date(request.due_date)
            .build()?;
        self.repo.create(&todo).await
    }

    pub async fn get(&self, id: &Identity) -> RepoResult<Option<Todo>> {
        self.repo.get_by_id(id).await
    }

    pub async fn list(&self) -> RepoResult<Vec<Todo>> {
        self.repo.get_all().await
    }

    pub async fn list_active(&self) -> RepoResult<Vec<Todo>> {
        self.repo.get_active().await
    }

    pub async fn list_completed(&self) -> RepoResult<Vec<Todo>> {
        self.repo.get_completed().await
    }

    pub async fn complete(&self, id: &Identity) -> RepoResult<()> {
        self.repo
            .update(id, &TodoPatch::new().completed(true))
            .await
    }

    pub async fn reopen(&self, id: &Identity) -> RepoResult<()> {
        self.repo
            .update(id, &TodoPatch::new().completed(false))
            .await
    }

    pub async fn rename(&self, id: &Identity, title: impl Into<String>) -> RepoResult<()> {
        self.repo.update(id, &TodoPatch::new().title(title)).await
    }

    pub async fn update(&self, id: &Identity, changes: &TodoPatch) -> RepoResult<()> {
        self.repo.update(id, changes).await
    }

    pub async fn delete(&self, id: &Identity) -> RepoResult<()> {
        self.repo.delete(id).await
    }

    /// Open todos whose due date is before `now` (epoch ms), newest first.
    pub async fn overdue(&self, now: i64) -> RepoResult<Vec<Todo>> {
        self.repo.find_by_specification(&IsOverdue { now }).await
    }

    pub async fn find(&self, spec: &dyn Specification<Todo>) -> RepoResult<Vec<Todo>> {
        self.repo.find_by_specification(spec).await
    }

    /// `(total, active, completed)`.
    pub async fn counts(&self) -> RepoResult<(u64, u64, u64)> {
        Ok((
            self.repo.count().await?,
            self.repo.count_active().await?,
            self.repo.count_completed().await?,
        ))
    }
}
