//! Domain records persisted in the collection store.
//!
//! # Invariants
//! - Ids are integers handed out by per-collection sequences and never reused.
//! - Audit records are append-only and never mutated after creation.

pub mod item;
pub mod progress;
pub mod task;
pub mod user;
