//! Todo repository contract and error taxonomy.
//!
//! # Responsibility
//! - Define the storage-agnostic CRUD + query surface for todos.
//! - Define the three error kinds every backend surfaces.
//!
//! # Invariants
//! - List operations return todos ordered by `created_at`, newest first.
//! - `count_active() + count_completed() == count()`.
//! - Missing ids surface as `NotFound` on update/delete and as `None` on
//!   reads, never as a driver error.

use crate::model::identity::{Identity, IdentityError};
use crate::model::patch::TodoPatch;
use crate::model::todo::{Todo, TodoValidationError};
use crate::specification::Specification;
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type RepoResult<T> = Result<T, RepoError>;

/// Opaque driver-level failure tagged with the backend that raised it.
#[derive(Debug)]
pub struct BackendFailure {
    backend: &'static str,
    source: Box<dyn Error + Send + Sync>,
}

impl BackendFailure {
    pub fn new<E>(backend: &'static str, source: E) -> Self
    where
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        Self {
            backend,
            source: source.into(),
        }
    }

    pub fn backend(&self) -> &'static str {
        self.backend
    }

    /// The wrapped driver error, unchanged.
    pub fn cause(&self) -> &(dyn Error + Send + Sync + 'static) {
        self.source.as_ref()
    }
}

impl Display for BackendFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} backend failure: {}", self.backend, self.source)
    }
}

impl Error for BackendFailure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.source.as_ref())
    }
}

/// Error kinds surfaced by every repository implementation.
#[derive(Debug)]
pub enum RepoError {
    NotFound(Identity),
    Validation(TodoValidationError),
    Backend(BackendFailure),
}

impl RepoError {
    /// Stable machine-readable code, used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Validation(_) => "validation_failed",
            Self::Backend(_) => "backend_failure",
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "todo not found: {id}"),
            Self::Validation(err) => write!(f, "invalid {}: {err}", err.field()),
            Self::Backend(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotFound(_) => None,
            Self::Validation(err) => Some(err),
            Self::Backend(err) => Some(err),
        }
    }
}

impl From<TodoValidationError> for RepoError {
    fn from(value: TodoValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<IdentityError> for RepoError {
    fn from(value: IdentityError) -> Self {
        Self::Validation(TodoValidationError::InvalidIdentity(value))
    }
}

impl From<BackendFailure> for RepoError {
    fn from(value: BackendFailure) -> Self {
        Self::Backend(value)
    }
}

/// Storage-agnostic todo persistence contract.
#[async_trait]
pub trait TodoRepository: Send + Sync {
    /// Persists a transient todo and returns its newly allocated identity.
    async fn create(&self, todo: &Todo) -> RepoResult<Identity>;
    async fn get_by_id(&self, id: &Identity) -> RepoResult<Option<Todo>>;
    async fn get_all(&self) -> RepoResult<Vec<Todo>>;
    async fn get_active(&self) -> RepoResult<Vec<Todo>>;
    async fn get_completed(&self) -> RepoResult<Vec<Todo>>;
    /// Merges `changes` into the stored todo. Omitted fields are preserved.
    async fn update(&self, id: &Identity, changes: &TodoPatch) -> RepoResult<()>;
    async fn delete(&self, id: &Identity) -> RepoResult<()>;
    async fn count(&self) -> RepoResult<u64>;
    async fn count_active(&self) -> RepoResult<u64>;
    async fn count_completed(&self) -> RepoResult<u64>;
    /// Returns every stored todo satisfying `spec`, newest first.
    async fn find_by_specification(
        &self,
        spec: &dyn Specification<Todo>,
    ) -> RepoResult<Vec<Todo>>;
}

#[async_trait]
impl<R> TodoRepository for Arc<R>
where
    R: TodoRepository + ?Sized,
{
    async fn create(&self, todo: &Todo) -> RepoResult<Identity> {
        (**self).create(todo).await
    }

    async fn get_by_id(&self, id: &Identity) -> RepoResult<Option<Todo>> {
        (**self).get_by_id(id).await
    }

    async fn get_all(&self) -> RepoResult<Vec<Todo>> {
        (**self).get_all().await
    }

    async fn get_active(&self) -> RepoResult<Vec<Todo>> {
        (**self).get_active().await
    }

    async fn get_completed(&self) -> RepoResult<Vec<Todo>> {
        (**self).get_completed().await
    }

    async fn update(&self, id: &Identity, changes: &TodoPatch) -> RepoResult<()> {
        (**self).update(id, changes).await
    }

    async fn delete(&self, id: &Identity) -> RepoResult<()> {
        (**self).delete(id).await
    }

    async fn count(&self) -> RepoResult<u64> {
        (**self).count().await
    }

    async fn count_active(&self) -> RepoResult<u64> {
        (**self).count_active().await
    }

    async fn count_completed(&self) -> RepoResult<u64> {
        (**self).count_completed().await
    }

    async fn find_by_specification(
        &self,
        spec: &dyn Specification<Todo>,
    ) -> RepoResult<Vec<Todo>> {
        (**self).find_by_specification(spec).await
    }
}
