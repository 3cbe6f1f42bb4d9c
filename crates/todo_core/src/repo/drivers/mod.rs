//! Engine-specific storage drivers.
//!
//! | Driver | Engine | Native id |
//! |--------|--------|-----------|
//! | [`MemoryDriver`] | process-local map | client uuid v4 |
//! | [`SqliteDriver`] | embedded SQL (rusqlite) | client uuid v4 |
//! | [`RelationalDriver`] | sqlx SQLite pool | column default uuid |
//! | [`ActiveRecordDriver`] | self-persisting `ActiveTodo` models | insert hook uuid |
//! | [`DocumentDriver`] | JSON document collection | ObjectId |

pub mod active_record;
pub mod document;
pub mod memory;
pub mod relational;
pub mod sqlite;

pub use active_record::{ActiveRecordDriver, ActiveTodo};
pub use document::{DocumentDriver, ObjectId};
pub use memory::MemoryDriver;
pub use relational::RelationalDriver;
pub use sqlite::SqliteDriver;
