//! Leaf specifications over [`Todo`].

use crate::model::todo::{Priority, Todo};
use crate::specification::Specification;

/// Matches completed todos.
#[derive(Debug, Clone, Copy, Default)]
pub struct IsCompleted;

impl Specification<Todo> for IsCompleted {
    fn is_satisfied_by(&self, candidate: &Todo) -> bool {
        candidate.completed()
    }
}

/// Matches todos that are still open.
#[derive(Debug, Clone, Copy, Default)]
pub struct IsActive;

impl Specification<Todo> for IsActive {
    fn is_satisfied_by(&self, candidate: &Todo) -> bool {
        !candidate.completed()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HasPriority(pub Priority);

impl Specification<Todo> for HasPriority {
    fn is_satisfied_by(&self, candidate: &Todo) -> bool {
        candidate.priority() == self.0
    }
}

/// Case-insensitive substring match on the title.
#[derive(Debug, Clone)]
pub struct TitleContains {
    needle: String,
}

impl TitleContains {
    pub fn new(needle: impl AsRef<str>) -> Self {
        Self {
            needle: needle.as_ref().to_lowercase(),
        }
    }
}

impl Specification<Todo> for TitleContains {
    fn is_satisfied_by(&self, candidate: &Todo) -> bool {
        candidate
            .title()
            .as_str()
            .to_lowercase()
            .contains(&self.needle)
    }
}

/// Matches todos with a due date strictly before the given epoch ms.
#[derive(Debug, Clone, Copy)]
pub struct DueBefore(pub i64);

impl Specification<Todo> for DueBefore {
    fn is_satisfied_by(&self, candidate: &Todo) -> bool {
        candidate.due_date().is_some_and(|due| due < self.0)
    }
}

/// Matches todos created strictly after the given epoch ms.
#[derive(Debug, Clone, Copy)]
pub struct CreatedAfter(pub i64);

impl Specification<Todo> for CreatedAfter {
    fn is_satisfied_by(&self, candidate: &Todo) -> bool {
        candidate.created_at() > self.0
    }
}

/// Open todos whose due date has passed at `now`.
#[derive(Debug, Clone, Copy)]
pub struct IsOverdue {
    pub now: i64,
}

impl Specification<Todo> for IsOverdue {
    fn is_satisfied_by(&self, candidate: &Todo) -> bool {
        candidate.is_overdue(self.now)
    }
}
