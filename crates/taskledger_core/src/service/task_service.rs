//! Task use-case service.
//!
//! # Responsibility
//! - Create tasks whose checklist is resolved against the catalog.
//! - Record progress and expose completion summaries.
//! - Provide the priority-ordered task listing used by task boards.
//!
//! # Invariants
//! - Checklist entries reference catalog items that existed at creation time.
//! - Listing order: priority high -> low, then newest first, then id desc.

use crate::model::item::ItemId;
use crate::model::progress::{ItemProgressInput, ProgressUpdateRecord};
use crate::model::task::{Task, TaskId, TaskItem, TaskPriority, TaskProgress, TaskStatus};
use crate::model::user::UserId;
use crate::repo::error::{EntityKind, RepoError, RepoResult};
use crate::repo::item_repo::ItemRepository;
use crate::repo::task_repo::{NewTask, TaskPatch, TaskRepository};
use chrono::NaiveDate;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Requested checklist line: catalog item and target quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskItemRequest {
    pub item_id: ItemId,
    pub quantity: u32,
}

/// Request model for creating a task with a catalog-backed checklist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    pub title: Option<String>,
    pub description: String,
    pub priority: TaskPriority,
    pub assigned_to: Option<UserId>,
    pub created_by: UserId,
    pub due_date: Option<NaiveDate>,
    /// Lines with quantity 0 are dropped; repeated item ids are merged.
    pub items: Vec<TaskItemRequest>,
}

/// Request model for editing a task. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateTaskRequest {
    /// `Some("")` clears the title.
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    /// Wins over the status derived from a replaced checklist.
    pub status: Option<TaskStatus>,
    pub assigned_to: Option<Option<UserId>>,
    pub due_date: Option<Option<NaiveDate>>,
    /// Replacement checklist. Items already on the task keep their name
    /// snapshot and completed quantity (clamped to the new target); new items
    /// are resolved against the catalog.
    pub items: Option<Vec<TaskItemRequest>>,
}

#[derive(Debug)]
pub enum TaskServiceError {
    EmptyDescription,
    /// Checklist references an item missing from the catalog.
    UnknownItem(ItemId),
    TaskNotFound(TaskId),
    Repo(RepoError),
}

impl Display for TaskServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyDescription => write!(f, "task description cannot be empty"),
            Self::UnknownItem(id) => write!(f, "catalog item not found: {id}"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TaskServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for TaskServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(entity) if entity.kind == EntityKind::Task => {
                Self::TaskNotFound(entity.id)
            }
            other => Self::Repo(other),
        }
    }
}

/// Task service facade over task and catalog repositories.
pub struct TaskService<T: TaskRepository, I: ItemRepository> {
    tasks: T,
    items: I,
}

impl<T: TaskRepository, I: ItemRepository> TaskService<T, I> {
    pub fn new(tasks: T, items: I) -> Self {
        Self { tasks, items }
    }

    /// Creates a pending task whose checklist names come from the catalog.
    ///
    /// Catalog lookups run before `create_task` and are not part of its
    /// transaction.
    pub fn create_task_with_items(
        &self,
        request: &CreateTaskRequest,
    ) -> Result<Task, TaskServiceError> {
        let description = request.description.trim();
        if description.is_empty() {
            return Err(TaskServiceError::EmptyDescription);
        }

        let checklist = self.resolve_checklist(&request.items, &[])?;

        let new_task = NewTask {
            title: request
                .title
                .as_deref()
                .map(str::trim)
                .filter(|title| !title.is_empty())
                .map(str::to_string),
            assigned_to: request.assigned_to,
            due_date: request.due_date,
            items: checklist,
            ..NewTask::new(description, request.priority, request.created_by)
        };
        Ok(self.tasks.create_task(&new_task)?)
    }

    /// Applies a partial edit; see [`UpdateTaskRequest`] for checklist rules.
    pub fn update_task(
        &self,
        task_id: TaskId,
        request: &UpdateTaskRequest,
    ) -> Result<Task, TaskServiceError> {
        let description = match request.description.as_deref().map(str::trim) {
            Some("") => return Err(TaskServiceError::EmptyDescription),
            other => other.map(str::to_string),
        };

        let items = match &request.items {
            Some(lines) => {
                let current = self
                    .tasks
                    .get_task(task_id)?
                    .ok_or(TaskServiceError::TaskNotFound(task_id))?;
                Some(self.resolve_checklist(lines, &current.items)?)
            }
            None => None,
        };

        let patch = TaskPatch {
            title: request
                .title
                .as_deref()
                .map(|title| Some(title.trim()).filter(|t| !t.is_empty()).map(str::to_string)),
            description,
            priority: request.priority,
            status: request.status,
            assigned_to: request.assigned_to,
            due_date: request.due_date,
            items,
        };
        Ok(self.tasks.update_task(task_id, &patch)?)
    }

    pub fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        self.tasks.get_task(id)
    }

    /// Lists every task, most urgent first.
    pub fn list_tasks_by_priority(&self) -> RepoResult<Vec<Task>> {
        let mut tasks = self.tasks.list_tasks()?;
        tasks.sort_by(|a, b| {
            b.priority
                .rank()
                .cmp(&a.priority.rank())
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(tasks)
    }

    /// Records progress against a task's checklist.
    pub fn record_progress(
        &self,
        task_id: TaskId,
        updates: &[ItemProgressInput],
        updated_by: UserId,
    ) -> Result<ProgressUpdateRecord, TaskServiceError> {
        Ok(self
            .tasks
            .add_task_item_update(task_id, updates, updated_by)?)
    }

    /// Audit history for one task, oldest first.
    pub fn progress_history(&self, task_id: TaskId) -> RepoResult<Vec<ProgressUpdateRecord>> {
        self.tasks.get_task_item_updates(Some(task_id))
    }

    pub fn task_progress(&self, task_id: TaskId) -> Result<TaskProgress, TaskServiceError> {
        self.tasks
            .get_task(task_id)?
            .map(|task| task.progress())
            .ok_or(TaskServiceError::TaskNotFound(task_id))
    }

    /// Explicit status override (e.g. cancelling a task).
    pub fn set_status(&self, task_id: TaskId, status: TaskStatus) -> Result<Task, TaskServiceError> {
        Ok(self.tasks.update_task_status(task_id, status)?)
    }

    pub fn delete_task(&self, task_id: TaskId) -> RepoResult<()> {
        self.tasks.delete_task(task_id)
    }

    /// Builds a checklist from request lines: drops zero quantities, merges
    /// repeated ids, reuses entries from `existing` and looks the rest up in
    /// the catalog.
    fn resolve_checklist(
        &self,
        lines: &[TaskItemRequest],
        existing: &[TaskItem],
    ) -> Result<Vec<TaskItem>, TaskServiceError> {
        let mut checklist: Vec<TaskItem> = Vec::new();
        for line in lines.iter().filter(|line| line.quantity > 0) {
            if let Some(entry) = checklist
                .iter_mut()
                .find(|entry| entry.item_id == line.item_id)
            {
                entry.quantity = entry.quantity.saturating_add(line.quantity);
                continue;
            }
            if let Some(kept) = existing.iter().find(|entry| entry.item_id == line.item_id) {
                let mut entry = TaskItem::new(kept.item_id, kept.item_name.clone(), line.quantity);
                entry.completed_quantity = kept.completed_quantity;
                checklist.push(entry);
                continue;
            }
            let item = self
                .items
                .get_item(line.item_id)?
                .ok_or(TaskServiceError::UnknownItem(line.item_id))?;
            checklist.push(TaskItem::new(item.id, item.name, line.quantity));
        }
        for entry in &mut checklist {
            entry.completed_quantity = entry.completed_quantity.min(entry.quantity);
        }
        Ok(checklist)
    }
}
