//! Repository error taxonomy.
//!
//! Every failure is distinguishable by kind: duplicate key, missing entity,
//! storage failure, undecodable persisted data, or checklist validation.

use crate::db::DbError;
use crate::model::task::{TaskId, TaskValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Collection an id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    User,
    Task,
    Item,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Task => "task",
            Self::Item => "item",
        }
    }
}

/// Reference to a record that was expected but not found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: i64,
}

impl EntityRef {
    pub fn user(id: i64) -> Self {
        Self {
            kind: EntityKind::User,
            id,
        }
    }

    pub fn task(id: i64) -> Self {
        Self {
            kind: EntityKind::Task,
            id,
        }
    }

    pub fn item(id: i64) -> Self {
        Self {
            kind: EntityKind::Item,
            id,
        }
    }
}

impl Display for EntityRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind.as_str(), self.id)
    }
}

/// Unique field that a create would have violated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DuplicateKey {
    UserEmail(String),
    TaskId(TaskId),
}

#[derive(Debug)]
pub enum RepoError {
    Duplicate(DuplicateKey),
    NotFound(EntityRef),
    Storage(DbError),
    InvalidData(String),
    Validation(TaskValidationError),
}

impl RepoError {
    /// Stable machine-readable error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Duplicate(_) => "duplicate",
            Self::NotFound(_) => "not_found",
            Self::Storage(_) => "storage",
            Self::InvalidData(_) => "invalid_data",
            Self::Validation(_) => "validation",
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Duplicate(DuplicateKey::UserEmail(email)) => {
                write!(f, "user already exists: {email}")
            }
            Self::Duplicate(DuplicateKey::TaskId(id)) => write!(f, "task id already exists: {id}"),
            Self::NotFound(entity) => write!(f, "{entity} not found"),
            Self::Storage(err) => write!(f, "storage failure: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::Validation(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::Duplicate(_) | Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Storage(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Storage(DbError::Sqlite(value))
    }
}

impl From<TaskValidationError> for RepoError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}
