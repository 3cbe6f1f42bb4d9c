//! Embedded JSON document collection.
//!
//! Documents are `TodoRecord` objects plus an `_id` ObjectId field. The
//! collection lives in memory and, when opened with a path, is mirrored to
//! a JSON-lines file after every write (one document per line).
//!
//! # Invariants
//! - `_id` values are ObjectIds generated by this driver and never reused.
//! - A write is visible only if it was also persisted; a failed flush rolls
//!   the in-memory collection back.
//! - The file is rewritten through a temp file + rename, never in place.

use crate::repo::driver::{DriverResult, StorageDriver};
use crate::repo::record::{RecordFilter, StoredRecord, TodoRecord};
use crate::repo::todo_repo::BackendFailure;
use async_trait::async_trait;
use log::info;
use once_cell::sync::Lazy;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;
use uuid::Uuid;

const BACKEND: &str = "document";
const ID_FIELD: &str = "_id";
const COUNTER_MASK: u32 = 0x00ff_ffff;

/// Per-process random bytes mixed into every ObjectId.
static PROCESS_UNIQUE: Lazy<[u8; 5]> = Lazy::new(|| {
    let random = Uuid::new_v4();
    let bytes = random.as_bytes();
    [bytes[0], bytes[1], bytes[2], bytes[3], bytes[4]]
});

static OBJECT_ID_COUNTER: Lazy<AtomicU32> = Lazy::new(|| {
    let random = Uuid::new_v4();
    let bytes = random.as_bytes();
    AtomicU32::new(u32::from_be_bytes([0, bytes[5], bytes[6], bytes[7]]))
});

/// 12-byte document id: 4-byte big-endian seconds, 5 process-random bytes,
/// 3-byte big-endian counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    pub fn generate() -> Self {
        let seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| u32::try_from(elapsed.as_secs()).unwrap_or(u32::MAX));
        let counter = OBJECT_ID_COUNTER.fetch_add(1, Ordering::Relaxed) & COUNTER_MASK;

        let mut bytes = [0_u8; 12];
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(PROCESS_UNIQUE.as_slice());
        bytes[9..].copy_from_slice(&counter.to_be_bytes()[1..]);
        Self(bytes)
    }

    /// Seconds since the unix epoch at generation time.
    pub fn timestamp(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|byte| format!("{byte:02x}")).collect()
    }
}

impl Display for ObjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

type Collection = BTreeMap<String, Value>;

/// Document collection optionally mirrored to a JSON-lines file.
pub struct DocumentDriver {
    documents: RwLock<Collection>,
    path: Option<PathBuf>,
}

impl DocumentDriver {
    /// Creates a collection that is never written to disk.
    pub fn in_memory() -> Self {
        Self {
            documents: RwLock::new(Collection::new()),
            path: None,
        }
    }

    /// Loads (or starts) the collection persisted at `path`.
    pub async fn open(path: impl Into<PathBuf>) -> DriverResult<Self> {
        let path = path.into();
        let documents = load_collection(&path).await?;
        info!(
            "event=collection_open module=repo backend={BACKEND} status=ok documents={}",
            documents.len()
        );
        Ok(Self {
            documents: RwLock::new(documents),
            path: Some(path),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    async fn persist(&self, documents: &Collection) -> DriverResult<()> {
        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(backend_error)?;
            }
        }

        let mut contents = String::new();
        for document in documents.values() {
            contents.push_str(&serde_json::to_string(document).map_err(backend_error)?);
            contents.push('\n');
        }

        let temp_path = path.with_extension("jsonl.tmp");
        tokio::fs::write(&temp_path, contents)
            .await
            .map_err(backend_error)?;
        tokio::fs::rename(&temp_path, path)
            .await
            .map_err(backend_error)?;
        Ok(())
    }
}

fn backend_error<E>(err: E) -> BackendFailure
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    BackendFailure::new(BACKEND, err)
}

async fn load_collection(path: &Path) -> DriverResult<Collection> {
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Collection::new()),
        Err(err) => return Err(backend_error(err)),
    };

    let mut documents = Collection::new();
    for (line_num, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let document: Value = serde_json::from_str(line).map_err(backend_error)?;
        let id = document
            .get(ID_FIELD)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                backend_error(format!("document at line {} has no string _id", line_num + 1))
            })?
            .to_string();
        documents.insert(id, document);
    }
    Ok(documents)
}

fn to_document(id: &str, record: &TodoRecord) -> DriverResult<Value> {
    let mut fields = match serde_json::to_value(record).map_err(backend_error)? {
        Value::Object(fields) => fields,
        _ => Map::new(),
    };
    fields.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
    Ok(Value::Object(fields))
}

fn from_document(document: &Value) -> DriverResult<TodoRecord> {
    serde_json::from_value(document.clone()).map_err(backend_error)
}

fn document_matches(document: &Value, filter: RecordFilter) -> bool {
    match filter.completed() {
        None => true,
        Some(completed) => document.get("completed").and_then(Value::as_bool) == Some(completed),
    }
}

#[async_trait]
impl StorageDriver for DocumentDriver {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    async fn insert(&self, record: &TodoRecord) -> DriverResult<String> {
        let mut documents = self.documents.write().await;
        let id = loop {
            let candidate = ObjectId::generate().to_hex();
            if !documents.contains_key(&candidate) {
                break candidate;
            }
        };

        documents.insert(id.clone(), to_document(&id, record)?);
        if let Err(err) = self.persist(&documents).await {
            documents.remove(&id);
            return Err(err);
        }
        Ok(id)
    }

    async fn fetch(&self, id: &str) -> DriverResult<Option<TodoRecord>> {
        let documents = self.documents.read().await;
        documents.get(id).map(from_document).transpose()
    }

    async fn fetch_all(&self, filter: RecordFilter) -> DriverResult<Vec<StoredRecord>> {
        let documents = self.documents.read().await;
        documents
            .iter()
            .filter(|(_, document)| document_matches(document, filter))
            .map(|(id, document)| {
                Ok(StoredRecord {
                    id: id.clone(),
                    record: from_document(document)?,
                })
            })
            .collect()
    }

    async fn replace(&self, id: &str, record: &TodoRecord) -> DriverResult<bool> {
        let mut documents = self.documents.write().await;
        if !documents.contains_key(id) {
            return Ok(false);
        }

        let replacement = to_document(id, record)?;
        let previous = documents.insert(id.to_string(), replacement);
        if let Err(err) = self.persist(&documents).await {
            if let Some(previous) = previous {
                documents.insert(id.to_string(), previous);
            }
            return Err(err);
        }
        Ok(true)
    }

    async fn remove(&self, id: &str) -> DriverResult<bool> {
        let mut documents = self.documents.write().await;
        let Some(previous) = documents.remove(id) else {
            return Ok(false);
        };

        if let Err(err) = self.persist(&documents).await {
            documents.insert(id.to_string(), previous);
            return Err(err);
        }
        Ok(true)
    }

    async fn count(&self, filter: RecordFilter) -> DriverResult<u64> {
        let documents = self.documents.read().await;
        let matching = documents
            .values()
            .filter(|document| document_matches(document, filter))
            .count();
        Ok(matching as u64)
    }
}
