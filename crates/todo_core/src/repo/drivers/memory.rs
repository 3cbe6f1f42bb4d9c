//! Process-local driver.
//!
//! # Invariants
//! - Every id ever issued is remembered, so deleted ids are never reissued
//!   for the lifetime of the driver. The issued set grows by one entry per
//!   `insert` and is only released when the driver is dropped.
//! - Racing writers to the same id resolve last-writer-wins.

use crate::repo::driver::{DriverResult, StorageDriver};
use crate::repo::record::{RecordFilter, StoredRecord, TodoRecord};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use uuid::Uuid;

const BACKEND: &str = "memory";

#[derive(Debug, Default)]
struct MemoryState {
    records: HashMap<String, TodoRecord>,
    issued: HashSet<String>,
}

/// Identity → record map guarded by an async lock.
#[derive(Debug, Default)]
pub struct MemoryDriver {
    state: RwLock<MemoryState>,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageDriver for MemoryDriver {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    async fn insert(&self, record: &TodoRecord) -> DriverResult<String> {
        let mut state = self.state.write().await;
        let id = loop {
            let candidate = Uuid::new_v4().to_string();
            if state.issued.insert(candidate.clone()) {
                break candidate;
            }
        };
        state.records.insert(id.clone(), record.clone());
        Ok(id)
    }

    async fn fetch(&self, id: &str) -> DriverResult<Option<TodoRecord>> {
        Ok(self.state.read().await.records.get(id).cloned())
    }

    async fn fetch_all(&self, filter: RecordFilter) -> DriverResult<Vec<StoredRecord>> {
        let state = self.state.read().await;
        Ok(state
            .records
            .iter()
            .filter(|(_, record)| filter.matches(record))
            .map(|(id, record)| StoredRecord {
                id: id.clone(),
                record: record.clone(),
            })
            .collect())
    }

    async fn replace(&self, id: &str, record: &TodoRecord) -> DriverResult<bool> {
        let mut state = self.state.write().await;
        match state.records.get_mut(id) {
            Some(slot) => {
                *slot = record.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove(&self, id: &str) -> DriverResult<bool> {
        Ok(self.state.write().await.records.remove(id).is_some())
    }

    async fn count(&self, filter: RecordFilter) -> DriverResult<u64> {
        let state = self.state.read().await;
        let matching = state
            .records
            .values()
            .filter(|record| filter.matches(record))
            .count();
        Ok(matching as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryDriver;
    use crate::repo::driver::StorageDriver;
    use crate::repo::record::{RecordFilter, TodoRecord};

    #[tokio::test]
    async fn removed_ids_stay_reserved() {
        let driver = MemoryDriver::new();
        let record = TodoRecord {
            title: "Buy milk".to_string(),
            completed: false,
            priority: "medium".to_string(),
            created_at: 1_000,
            due_date: None,
        };

        let first = driver.insert(&record).await.unwrap();
        assert!(driver.remove(&first).await.unwrap());
        let second = driver.insert(&record).await.unwrap();

        let state = driver.state.read().await;
        assert_ne!(first, second);
        assert!(!state.records.contains_key(&first));
        assert!(state.issued.contains(&first));
        assert_eq!(state.issued.len(), 2);
        drop(state);

        assert_eq!(driver.count(RecordFilter::All).await.unwrap(), 1);
        assert!(!driver.replace(&first, &record).await.unwrap());
    }
}
