//! Todo domain model and identity value type.
//!
//! # Responsibility
//! - Define canonical data structures used by repositories and services.
//! - Keep every field invariant next to the value that owns it.
//!
//! # Invariants
//! - Domain values are immutable; updates produce new snapshots.
//! - A todo gains an `Identity` only when a repository persists it.

pub mod identity;
pub mod patch;
pub mod todo;
