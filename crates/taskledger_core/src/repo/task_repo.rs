//! Task and progress-audit repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - CRUD over the `tasks` collection.
//! - Apply progress increments and append audit records to `taskItemUpdates`.
//!
//! # Invariants
//! - Write paths call `Task::validate()` before persisting.
//! - A progress update writes the task and its audit record in one
//!   transaction.
//! - Audit records are append-only.
//! - `assigned_to_email` is resolved from `users` whenever the assignee is set.

use crate::model::progress::{ItemProgressInput, ProgressUpdateRecord};
use crate::model::task::{Task, TaskId, TaskItem, TaskPriority, TaskStatus};
use crate::model::user::{User, UserId};
use crate::repo::error::{DuplicateKey, EntityRef, RepoError, RepoResult};
use crate::repo::kv_store::{
    ensure_store_ready, write_transaction, KvStore, TASKS_KEY, TASK_ID_COUNTER_KEY,
    TASK_ITEM_UPDATES_KEY, USERS_KEY,
};
use crate::repo::sequence::IdSequence;
use chrono::{DateTime, NaiveDate, Utc};
use log::{info, warn};
use rusqlite::Connection;
use uuid::Uuid;

/// Input for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    /// Caller-chosen id (imports); allocated from the sequence when `None`.
    pub id: Option<TaskId>,
    pub title: Option<String>,
    pub description: String,
    pub priority: TaskPriority,
    /// Defaults to `Pending`.
    pub status: Option<TaskStatus>,
    pub assigned_to: Option<UserId>,
    pub created_by: UserId,
    pub due_date: Option<NaiveDate>,
    /// Defaults to now.
    pub created_at: Option<DateTime<Utc>>,
    pub items: Vec<TaskItem>,
}

impl NewTask {
    pub fn new(description: impl Into<String>, priority: TaskPriority, created_by: UserId) -> Self {
        Self {
            id: None,
            title: None,
            description: description.into(),
            priority,
            status: None,
            assigned_to: None,
            created_by,
            due_date: None,
            created_at: None,
            items: Vec::new(),
        }
    }
}

/// Partial update for an existing task. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<Option<String>>,
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    pub status: Option<TaskStatus>,
    pub assigned_to: Option<Option<UserId>>,
    pub due_date: Option<Option<NaiveDate>>,
    /// Replaces the checklist; status is re-derived unless `status` is set.
    pub items: Option<Vec<TaskItem>>,
}

/// Repository interface for tasks and their progress audit log.
pub trait TaskRepository {
    fn create_task(&self, new_task: &NewTask) -> RepoResult<Task>;
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    /// Lists tasks in insertion order.
    fn list_tasks(&self) -> RepoResult<Vec<Task>>;
    fn update_task(&self, id: TaskId, patch: &TaskPatch) -> RepoResult<Task>;
    /// Overwrites status without derivation.
    fn update_task_status(&self, id: TaskId, status: TaskStatus) -> RepoResult<Task>;
    /// Removes the task. Unknown ids are a no-op.
    fn delete_task(&self, id: TaskId) -> RepoResult<()>;
    /// Applies clamped increments, re-derives status and appends an audit record.
    fn add_task_item_update(
        &self,
        task_id: TaskId,
        item_updates: &[ItemProgressInput],
        updated_by: UserId,
    ) -> RepoResult<ProgressUpdateRecord>;
    /// Returns audit records in append order, optionally for one task.
    fn get_task_item_updates(&self, task_id: Option<TaskId>)
        -> RepoResult<Vec<ProgressUpdateRecord>>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_store_ready(conn)?;
        Ok(Self { conn })
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create_task(&self, new_task: &NewTask) -> RepoResult<Task> {
        let task = write_transaction(self.conn, |store| {
            let mut tasks: Vec<Task> = store.load_collection(TASKS_KEY)?;
            let max_id = tasks.iter().map(|task| task.id).max();
            let mut ids = IdSequence::load(store, TASK_ID_COUNTER_KEY, max_id)?;

            let id = match new_task.id {
                Some(id) if tasks.iter().any(|task| task.id == id) => {
                    return Err(RepoError::Duplicate(DuplicateKey::TaskId(id)));
                }
                Some(id) => {
                    ids.observe(id);
                    id
                }
                None => ids.allocate(),
            };

            let now = Utc::now();
            let task = Task {
                id,
                title: new_task.title.clone(),
                description: new_task.description.clone(),
                priority: new_task.priority,
                status: new_task.status.unwrap_or(TaskStatus::Pending),
                assigned_to: new_task.assigned_to,
                assigned_to_email: resolve_assignee_email(store, new_task.assigned_to)?,
                created_by: new_task.created_by,
                due_date: new_task.due_date,
                created_at: new_task.created_at.unwrap_or(now),
                updated_at: now,
                items: new_task.items.clone(),
            };
            task.validate()?;

            tasks.push(task.clone());
            store.save_collection(TASKS_KEY, &tasks)?;
            ids.persist(store)?;
            Ok(task)
        })?;

        info!(
            "event=task_create module=repo status=ok task_id={} items={} priority={}",
            task.id,
            task.items.len(),
            task.priority.as_str()
        );
        Ok(task)
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let tasks: Vec<Task> = KvStore::new(self.conn).load_collection(TASKS_KEY)?;
        Ok(tasks.into_iter().find(|task| task.id == id))
    }

    fn list_tasks(&self) -> RepoResult<Vec<Task>> {
        KvStore::new(self.conn).load_collection(TASKS_KEY)
    }

    fn update_task(&self, id: TaskId, patch: &TaskPatch) -> RepoResult<Task> {
        write_transaction(self.conn, |store| {
            let mut tasks: Vec<Task> = store.load_collection(TASKS_KEY)?;
            let index = find_task_index(&tasks, id)?;

            let mut task = tasks[index].clone();
            if let Some(title) = &patch.title {
                task.title = title.clone();
            }
            if let Some(description) = &patch.description {
                task.description = description.clone();
            }
            if let Some(priority) = patch.priority {
                task.priority = priority;
            }
            if let Some(assigned_to) = patch.assigned_to {
                task.assigned_to = assigned_to;
                task.assigned_to_email = resolve_assignee_email(store, assigned_to)?;
            }
            if let Some(due_date) = patch.due_date {
                task.due_date = due_date;
            }
            if let Some(items) = &patch.items {
                task.items = items.clone();
                task.rederive_status();
            }
            if let Some(status) = patch.status {
                task.status = status;
            }
            task.updated_at = Utc::now();
            task.validate()?;

            tasks[index] = task.clone();
            store.save_collection(TASKS_KEY, &tasks)?;
            Ok(task)
        })
    }

    fn update_task_status(&self, id: TaskId, status: TaskStatus) -> RepoResult<Task> {
        let task = write_transaction(self.conn, |store| {
            let mut tasks: Vec<Task> = store.load_collection(TASKS_KEY)?;
            let index = find_task_index(&tasks, id)?;
            let task = &mut tasks[index];
            task.status = status;
            task.updated_at = Utc::now();
            let updated = task.clone();

            store.save_collection(TASKS_KEY, &tasks)?;
            Ok(updated)
        })?;

        info!(
            "event=task_status module=repo status=ok task_id={} task_status={}",
            task.id,
            task.status.as_str()
        );
        Ok(task)
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<()> {
        write_transaction(self.conn, |store| {
            let mut tasks: Vec<Task> = store.load_collection(TASKS_KEY)?;
            let before = tasks.len();
            tasks.retain(|task| task.id != id);
            if tasks.len() != before {
                store.save_collection(TASKS_KEY, &tasks)?;
            }
            Ok(())
        })
    }

    fn add_task_item_update(
        &self,
        task_id: TaskId,
        item_updates: &[ItemProgressInput],
        updated_by: UserId,
    ) -> RepoResult<ProgressUpdateRecord> {
        let record = write_transaction(self.conn, |store| {
            let mut tasks: Vec<Task> = store.load_collection(TASKS_KEY)?;
            let index = find_task_index(&tasks, task_id)?;
            let mut audit_log: Vec<ProgressUpdateRecord> =
                store.load_collection(TASK_ITEM_UPDATES_KEY)?;

            let now = Utc::now();
            let task = &mut tasks[index];
            let deltas = task.apply_progress(item_updates);
            task.updated_at = now;
            if deltas.len() < item_updates.len() {
                warn!(
                    "event=task_progress module=repo status=partial task_id={} requested={} applied={}",
                    task_id,
                    item_updates.len(),
                    deltas.len()
                );
            }

            let record = ProgressUpdateRecord {
                id: Uuid::new_v4(),
                task_id,
                task_description: task.description.clone(),
                updated_by,
                updated_at: now,
                item_updates: deltas,
            };

            audit_log.push(record.clone());
            store.save_collection(TASK_ITEM_UPDATES_KEY, &audit_log)?;
            store.save_collection(TASKS_KEY, &tasks)?;
            Ok(record)
        })?;

        info!(
            "event=task_progress module=repo status=ok task_id={} update_id={} items={}",
            record.task_id,
            record.id,
            record.item_updates.len()
        );
        Ok(record)
    }

    fn get_task_item_updates(
        &self,
        task_id: Option<TaskId>,
    ) -> RepoResult<Vec<ProgressUpdateRecord>> {
        let mut audit_log: Vec<ProgressUpdateRecord> =
            KvStore::new(self.conn).load_collection(TASK_ITEM_UPDATES_KEY)?;
        if let Some(task_id) = task_id {
            audit_log.retain(|record| record.task_id == task_id);
        }
        Ok(audit_log)
    }
}

fn find_task_index(tasks: &[Task], id: TaskId) -> RepoResult<usize> {
    tasks
        .iter()
        .position(|task| task.id == id)
        .ok_or(RepoError::NotFound(EntityRef::task(id)))
}

/// Unknown assignees resolve to no email rather than an error.
fn resolve_assignee_email(
    store: &KvStore<'_>,
    assigned_to: Option<UserId>,
) -> RepoResult<Option<String>> {
    let Some(user_id) = assigned_to else {
        return Ok(None);
    };
    let users: Vec<User> = store.load_collection(USERS_KEY)?;
    Ok(users
        .into_iter()
        .find(|user| user.id == user_id)
        .map(|user| user.email))
}
