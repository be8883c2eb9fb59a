//! Repository layer over the key-value collection store.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts per collection.
//! - Keep key names, JSON encoding and id allocation inside this boundary.
//!
//! # Invariants
//! - Every mutation is one transaction that rewrites whole collections.
//! - Repository APIs return semantic errors (`Duplicate`, `NotFound`) in
//!   addition to storage errors.

pub mod error;
pub mod item_repo;
pub mod kv_store;
pub mod sequence;
pub mod task_repo;
pub mod user_repo;
