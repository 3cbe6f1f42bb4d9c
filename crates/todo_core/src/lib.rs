//! Core data-access layer for todos.
//! This crate is the single source of truth for todo invariants and the
//! repository contract every storage backend implements.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod specification;

pub use config::{open_repository, BackendKind, ConfigError, StoreConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::identity::{
    Identity, IdentityError, IdentityValidator, ObjectIdValidator, UuidValidator,
    ValidatorRegistry,
};
pub use model::patch::{PatchValue, TodoPatch};
pub use model::todo::{Priority, Title, Todo, TodoBuilder, TodoValidationError};
pub use repo::store::TodoStore;
pub use repo::todo_repo::{BackendFailure, RepoError, RepoResult, TodoRepository};
pub use service::todo_service::{NewTodo, TodoService};
pub use specification::{BoxedSpecification, Specification};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
