//! Flat storage shape shared by all drivers.
//!
//! # Invariants
//! - Records hold primitives only; value objects are flattened on the way
//!   in and rebuilt (and revalidated) on the way out.
//! - Ids live outside the record so each backend can keep its own key
//!   column or `_id` field.

use crate::model::identity::ValidatorRegistry;
use crate::model::todo::{Priority, Todo, TodoValidationError};
use serde::{Deserialize, Serialize};

/// Row/document representation of one todo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoRecord {
    pub title: String,
    pub completed: bool,
    pub priority: String,
    pub created_at: i64,
    pub due_date: Option<i64>,
}

impl TodoRecord {
    pub fn from_todo(todo: &Todo) -> Self {
        Self {
            title: todo.title().as_str().to_string(),
            completed: todo.completed(),
            priority: todo.priority().as_str().to_string(),
            created_at: todo.created_at(),
            due_date: todo.due_date(),
        }
    }

    /// Rebuilds the domain todo stored under `id`.
    pub fn into_todo(
        self,
        id: &str,
        registry: &ValidatorRegistry,
    ) -> Result<Todo, TodoValidationError> {
        let identity = registry.identity(id)?;
        let priority: Priority = self.priority.parse()?;
        Todo::builder(self.title)
            .id(identity)
            .completed(self.completed)
            .priority(priority)
            .created_at(self.created_at)
            .due_date(self.due_date)
            .build()
    }
}

/// A record together with the backend key it is stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub id: String,
    pub record: TodoRecord,
}

/// Completion filter pushed down to drivers for lists and counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFilter {
    All,
    Active,
    Completed,
}

impl RecordFilter {
    /// Required `completed` value, or `None` for no constraint.
    pub fn completed(self) -> Option<bool> {
        match self {
            Self::All => None,
            Self::Active => Some(false),
            Self::Completed => Some(true),
        }
    }

    pub fn matches(self, record: &TodoRecord) -> bool {
        self.completed()
            .map_or(true, |completed| record.completed == completed)
    }
}

#[cfg(test)]
mod tests {
    use super::{RecordFilter, TodoRecord};
    use crate::model::identity::ValidatorRegistry;
    use crate::model::todo::{Priority, Todo};

    #[test]
    fn record_roundtrip_rebuilds_value_objects() {
        let registry = ValidatorRegistry::with_defaults();
        let todo = Todo::builder("  Buy milk ")
            .priority(Priority::High)
            .created_at(1_000)
            .due_date(Some(2_000))
            .build()
            .unwrap();

        let record = TodoRecord::from_todo(&todo);
        assert_eq!(record.title, "Buy milk");
        assert_eq!(record.priority, "high");

        let loaded = record
            .into_todo("11111111-2222-4333-8444-555555555555", &registry)
            .unwrap();
        assert_eq!(
            loaded.id().map(|id| id.as_str()),
            Some("11111111-2222-4333-8444-555555555555")
        );
        assert_eq!(loaded.title(), todo.title());
        assert_eq!(loaded.priority(), Priority::High);
        assert_eq!(loaded.due_date(), Some(2_000));
    }

    #[test]
    fn invalid_persisted_values_are_rejected() {
        let registry = ValidatorRegistry::with_defaults();
        let record = TodoRecord {
            title: "Buy milk".to_string(),
            completed: false,
            priority: "urgent".to_string(),
            created_at: 1_000,
            due_date: None,
        };

        let err = record
            .clone()
            .into_todo("65a1f0c2e4b0a1b2c3d4e5f6", &registry)
            .unwrap_err();
        assert_eq!(err.field(), "priority");

        let err = record.into_todo("bogus", &registry).unwrap_err();
        assert_eq!(err.field(), "id");
    }

    #[test]
    fn filter_matches_completion_flag() {
        let mut record = TodoRecord {
            title: "Walk dog".to_string(),
            completed: false,
            priority: "low".to_string(),
            created_at: 0,
            due_date: None,
        };
        assert!(RecordFilter::All.matches(&record));
        assert!(RecordFilter::Active.matches(&record));
        assert!(!RecordFilter::Completed.matches(&record));

        record.completed = true;
        assert!(RecordFilter::Completed.matches(&record));
    }
}
