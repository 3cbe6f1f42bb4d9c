//! Todo persistence: the async repository contract, the generic store that
//! implements it, and one storage driver per engine.
//!
//! # Responsibility
//! - `todo_repo`: contract and error taxonomy callers program against.
//! - `store`: backend-independent validation, mapping and ordering.
//! - `driver` / `drivers`: the narrow engine seam and its implementations.
//!
//! # Invariants
//! - Every backend passes the same contract; callers never branch on which
//!   one is active.

pub mod driver;
pub mod drivers;
pub mod record;
pub mod store;
pub mod todo_repo;
