//! Todo domain model.
//!
//! # Responsibility
//! - Define the immutable todo entity and its value objects.
//! - Own every field-level invariant enforced by repositories.
//!
//! # Invariants
//! - `title` is 2..=255 characters after trimming.
//! - `created_at` is set once at construction and never changes.
//! - `due_date`, when set, must not precede `created_at`.
//! - Mutation never happens in place: `with_id`/`apply` return new values.

use crate::model::identity::{Identity, IdentityError};
use crate::model::patch::TodoPatch;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

pub const TITLE_MIN_CHARS: usize = 2;
pub const TITLE_MAX_CHARS: usize = 255;

/// Returns the current wall-clock time in epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
        })
}

/// Field-level validation failure raised while building domain values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodoValidationError {
    TitleTooShort { chars: usize },
    TitleTooLong { chars: usize },
    UnknownPriority(String),
    DueBeforeCreation { created_at: i64, due_date: i64 },
    InvalidIdentity(IdentityError),
}

impl TodoValidationError {
    /// Wire name of the field that failed validation.
    pub fn field(&self) -> &'static str {
        match self {
            Self::TitleTooShort { .. } | Self::TitleTooLong { .. } => "title",
            Self::UnknownPriority(_) => "priority",
            Self::DueBeforeCreation { .. } => "dueDate",
            Self::InvalidIdentity(_) => "id",
        }
    }
}

impl Display for TodoValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TitleTooShort { chars } => write!(
                f,
                "title must be at least {TITLE_MIN_CHARS} characters, got {chars}"
            ),
            Self::TitleTooLong { chars } => write!(
                f,
                "title must be at most {TITLE_MAX_CHARS} characters, got {chars}"
            ),
            Self::UnknownPriority(value) => write!(
                f,
                "unknown priority `{value}`; expected low|medium|high"
            ),
            Self::DueBeforeCreation {
                created_at,
                due_date,
            } => write!(
                f,
                "dueDate ({due_date}) must be >= createdAt ({created_at})"
            ),
            Self::InvalidIdentity(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TodoValidationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidIdentity(err) => Some(err),
            _ => None,
        }
    }
}

impl From<IdentityError> for TodoValidationError {
    fn from(value: IdentityError) -> Self {
        Self::InvalidIdentity(value)
    }
}

/// Trimmed, length-bounded todo title.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Title(String);

impl Title {
    pub fn new(value: impl AsRef<str>) -> Result<Self, TodoValidationError> {
        let trimmed = value.as_ref().trim();
        let chars = trimmed.chars().count();
        if chars < TITLE_MIN_CHARS {
            return Err(TodoValidationError::TitleTooShort { chars });
        }
        if chars > TITLE_MAX_CHARS {
            return Err(TodoValidationError::TitleTooLong { chars });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Title {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Todo urgency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl FromStr for Priority {
    type Err = TodoValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(TodoValidationError::UnknownPriority(value.to_string())),
        }
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable todo snapshot.
///
/// A todo without `id` is transient; repositories attach the identity they
/// allocate when the todo is read back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    id: Option<Identity>,
    title: Title,
    completed: bool,
    priority: Priority,
    /// Unix epoch milliseconds.
    created_at: i64,
    /// Unix epoch milliseconds.
    due_date: Option<i64>,
}

impl Todo {
    /// Creates a transient todo with default priority, created now.
    pub fn new(title: impl Into<String>) -> Result<Self, TodoValidationError> {
        Self::builder(title).build()
    }

    pub fn builder(title: impl Into<String>) -> TodoBuilder {
        TodoBuilder::new(title)
    }

    pub fn id(&self) -> Option<&Identity> {
        self.id.as_ref()
    }

    pub fn title(&self) -> &Title {
        &self.title
    }

    pub fn completed(&self) -> bool {
        self.completed
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn due_date(&self) -> Option<i64> {
        self.due_date
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Returns whether the todo is open and past its due date at `now`.
    pub fn is_overdue(&self, now: i64) -> bool {
        !self.completed && self.due_date.is_some_and(|due| due < now)
    }

    /// Re-checks cross-field invariants.
    pub fn validate(&self) -> Result<(), TodoValidationError> {
        if let Some(due_date) = self.due_date {
            if due_date < self.created_at {
                return Err(TodoValidationError::DueBeforeCreation {
                    created_at: self.created_at,
                    due_date,
                });
            }
        }
        Ok(())
    }

    /// Returns a copy of this todo bound to `id`.
    pub fn with_id(&self, id: Identity) -> Self {
        Self {
            id: Some(id),
            ..self.clone()
        }
    }

    /// Returns a copy with `patch` merged in.
    ///
    /// Fields absent from `patch` are preserved. `id` and `created_at` are
    /// never touched.
    pub fn apply(&self, patch: &TodoPatch) -> Result<Self, TodoValidationError> {
        let title = match patch.title.as_ref() {
            Some(value) => Title::new(value.get())?,
            None => self.title.clone(),
        };
        let priority = match patch.priority.as_ref() {
            Some(value) => value.get().parse()?,
            None => self.priority,
        };
        let updated = Self {
            id: self.id.clone(),
            title,
            completed: patch.completed.unwrap_or(self.completed),
            priority,
            created_at: self.created_at,
            due_date: patch.due_date.unwrap_or(self.due_date),
        };
        updated.validate()?;
        Ok(updated)
    }
}

/// Staged constructor for [`Todo`].
#[derive(Debug, Clone)]
pub struct TodoBuilder {
    id: Option<Identity>,
    title: String,
    completed: bool,
    priority: Priority,
    created_at: Option<i64>,
    due_date: Option<i64>,
}

impl TodoBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            completed: false,
            priority: Priority::default(),
            created_at: None,
            due_date: None,
        }
    }

    pub fn id(mut self, id: Identity) -> Self {
        self.id = Some(id);
        self
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Overrides the creation time. Used by import and storage paths.
    pub fn created_at(mut self, epoch_ms: i64) -> Self {
        self.created_at = Some(epoch_ms);
        self
    }

    pub fn due_date(mut self, epoch_ms: Option<i64>) -> Self {
        self.due_date = epoch_ms;
        self
    }

    pub fn build(self) -> Result<Todo, TodoValidationError> {
        let todo = Todo {
            id: self.id,
            title: Title::new(&self.title)?,
            completed: self.completed,
            priority: self.priority,
            created_at: self.created_at.unwrap_or_else(now_epoch_ms),
            due_date: self.due_date,
        };
        todo.validate()?;
        Ok(todo)
    }
}
