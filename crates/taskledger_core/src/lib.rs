//! Core domain logic for TaskLedger.
//!
//! Tasks carry quantifiable checklist items; progress submissions raise the
//! completed quantities, re-derive task status and append an audit record.
//! All state lives in a SQLite-backed key-value store of JSON collections.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::item::{Item, ItemId, DEFAULT_ITEMS};
pub use model::progress::{
    ItemProgressDelta, ItemProgressInput, ProgressUpdateId, ProgressUpdateRecord,
};
pub use model::task::{
    derive_status, Task, TaskId, TaskItem, TaskPriority, TaskProgress, TaskStatus,
    TaskValidationError,
};
pub use model::user::{User, UserId, UserRole};
pub use repo::error::{DuplicateKey, EntityKind, EntityRef, RepoError, RepoResult};
pub use repo::item_repo::{ItemRepository, SqliteItemRepository};
pub use repo::task_repo::{NewTask, SqliteTaskRepository, TaskPatch, TaskRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use service::auth_service::{
    hash_password, AuthService, AuthServiceError, DEMO_ACCOUNTS, DEMO_PASSWORD_HASH,
};
pub use service::catalog_service::{CatalogService, CatalogServiceError};
pub use service::task_service::{
    CreateTaskRequest, TaskItemRequest, TaskService, TaskServiceError, UpdateTaskRequest,
};

/// Minimal health-check API for embedding hosts.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
