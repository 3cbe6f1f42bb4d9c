//! Partial-update payloads for todos.
//!
//! Callers may send each value-object field either as a raw primitive
//! (`"title": "Buy milk"`) or in its value-object shape
//! (`"title": {"value": "Buy milk"}`). Both normalize to the primitive.

use crate::model::todo::Priority;
use serde::{Deserialize, Deserializer};

/// A patched field in raw or value-object shape.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PatchValue<T> {
    Raw(T),
    Wrapped { value: T },
}

impl<T> PatchValue<T> {
    pub fn get(&self) -> &T {
        match self {
            Self::Raw(value) | Self::Wrapped { value } => value,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Self::Raw(value) | Self::Wrapped { value } => value,
        }
    }
}

/// Field-wise changes for an existing todo. `None` means "keep".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoPatch {
    #[serde(default)]
    pub title: Option<PatchValue<String>>,
    #[serde(default)]
    pub completed: Option<bool>,
    #[serde(default)]
    pub priority: Option<PatchValue<String>>,
    /// `Some(None)` clears the due date; JSON `null` maps to it.
    #[serde(default, deserialize_with = "deserialize_present")]
    pub due_date: Option<Option<i64>>,
}

impl TodoPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(PatchValue::Raw(title.into()));
        self
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(PatchValue::Raw(priority.as_str().to_string()));
        self
    }

    pub fn due_date(mut self, due_date: Option<i64>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.completed.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
    }
}

fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::{PatchValue, TodoPatch};

    #[test]
    fn accepts_raw_and_wrapped_shapes() {
        let raw: TodoPatch =
            serde_json::from_value(serde_json::json!({"title": "Buy milk", "priority": "high"}))
                .unwrap();
        let wrapped: TodoPatch = serde_json::from_value(serde_json::json!({
            "title": {"value": "Buy milk"},
            "priority": {"value": "high"}
        }))
        .unwrap();

        assert_eq!(raw.title.as_ref().map(PatchValue::get).unwrap(), "Buy milk");
        assert_eq!(
            wrapped.title.clone().map(PatchValue::into_inner).unwrap(),
            "Buy milk"
        );
        assert_eq!(raw.priority.unwrap().get(), wrapped.priority.unwrap().get());
    }

    #[test]
    fn due_date_distinguishes_absent_from_null() {
        let absent: TodoPatch =
            serde_json::from_value(serde_json::json!({"completed": true})).unwrap();
        assert_eq!(absent.due_date, None);
        assert_eq!(absent.completed, Some(true));

        let cleared: TodoPatch =
            serde_json::from_value(serde_json::json!({"dueDate": null})).unwrap();
        assert_eq!(cleared.due_date, Some(None));

        let set: TodoPatch =
            serde_json::from_value(serde_json::json!({"dueDate": 1_700_000_000_000_i64}))
                .unwrap();
        assert_eq!(set.due_date, Some(Some(1_700_000_000_000)));
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(TodoPatch::new().is_empty());
        assert!(!TodoPatch::new().completed(false).is_empty());
    }
}
