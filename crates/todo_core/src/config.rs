//! Backend selection and repository wiring.
//!
//! # Responsibility
//! - Parse which storage backend to use and where it keeps its data.
//! - Build a ready-to-use `TodoRepository` for that backend.
//!
//! # Invariants
//! - Without configuration the in-memory backend is used.
//! - File-backed backends always receive an explicit location.

use crate::db::DbError;
use crate::model::identity::ValidatorRegistry;
use crate::repo::drivers::{
    ActiveRecordDriver, DocumentDriver, MemoryDriver, RelationalDriver, SqliteDriver,
};
use crate::repo::store::TodoStore;
use crate::repo::todo_repo::{BackendFailure, TodoRepository};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

pub const BACKEND_ENV: &str = "TODO_BACKEND";
pub const DATABASE_URL_ENV: &str = "TODO_DATABASE_URL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    #[default]
    Memory,
    Sqlite,
    Relational,
    ActiveRecord,
    Document,
}

impl BackendKind {
    pub const ALL: [BackendKind; 5] = [
        Self::Memory,
        Self::Sqlite,
        Self::Relational,
        Self::ActiveRecord,
        Self::Document,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Sqlite => "sqlite",
            Self::Relational => "relational",
            Self::ActiveRecord => "active_record",
            Self::Document => "document",
        }
    }
}

impl Display for BackendKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| ConfigError::UnknownBackend(value.to_string()))
    }
}

#[derive(Debug)]
pub enum ConfigError {
    UnknownBackend(String),
    Db(DbError),
    Backend(BackendFailure),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownBackend(value) => write!(
                f,
                "unknown backend `{value}`; expected memory|sqlite|relational|active_record|document"
            ),
            Self::Db(err) => write!(f, "database open failed: {err}"),
            Self::Backend(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::UnknownBackend(_) => None,
            Self::Db(err) => Some(err),
            Self::Backend(err) => Some(err),
        }
    }
}

impl From<DbError> for ConfigError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<BackendFailure> for ConfigError {
    fn from(value: BackendFailure) -> Self {
        Self::Backend(value)
    }
}

/// Which backend to open and where its data lives.
///
/// `location` is a file path for `sqlite` and `document`, a sqlx URL
/// (`sqlite://todos.db`) for `relational` and `active_record`. `None` means
/// an ephemeral in-memory store for every backend.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StoreConfig {
    pub backend: BackendKind,
    pub location: Option<String>,
}

impl StoreConfig {
    pub fn new(backend: BackendKind, location: Option<String>) -> Self {
        Self { backend, location }
    }

    /// Reads `TODO_BACKEND` and `TODO_DATABASE_URL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = match non_blank(lookup(BACKEND_ENV)) {
            Some(value) => value.parse()?,
            None => BackendKind::default(),
        };
        Ok(Self {
            backend,
            location: non_blank(lookup(DATABASE_URL_ENV)),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Opens the configured backend behind the repository contract.
pub async fn open_repository(
    config: &StoreConfig,
    registry: Arc<ValidatorRegistry>,
) -> Result<Arc<dyn TodoRepository>, ConfigError> {
    let location = config.location.as_deref();
    let repo: Arc<dyn TodoRepository> = match config.backend {
        BackendKind::Memory => Arc::new(TodoStore::new(MemoryDriver::new(), registry)),
        BackendKind::Sqlite => {
            let driver = match location {
                Some(path) => SqliteDriver::open(path)?,
                None => SqliteDriver::open_in_memory()?,
            };
            Arc::new(TodoStore::new(driver, registry))
        }
        BackendKind::Relational => {
            let driver = match location {
                Some(url) => RelationalDriver::connect(url).await?,
                None => RelationalDriver::in_memory().await?,
            };
            Arc::new(TodoStore::new(driver, registry))
        }
        BackendKind::ActiveRecord => {
            let driver = match location {
                Some(url) => ActiveRecordDriver::connect(url).await?,
                None => ActiveRecordDriver::in_memory().await?,
            };
            Arc::new(TodoStore::new(driver, registry))
        }
        BackendKind::Document => {
            let driver = match location {
                Some(path) => DocumentDriver::open(path).await?,
                None => DocumentDriver::in_memory(),
            };
            Arc::new(TodoStore::new(driver, registry))
        }
    };

    info!(
        "event=repo_open module=config status=ok backend={} persistent={}",
        config.backend,
        location.is_some()
    );
    Ok(repo)
}
