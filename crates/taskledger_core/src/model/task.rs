//! Task domain model and the item-completion status rule.
//!
//! # Responsibility
//! - Define tasks and their embedded checklist items.
//! - Apply clamped progress increments to checklist items.
//! - Derive task status from item completion state.
//!
//! # Invariants
//! - `0 <= completed_quantity <= quantity` for every checklist item.
//! - `quantity` is strictly positive.
//! - One checklist entry per catalog item within a task.
//! - Status derivation is a pure function of the items and is idempotent.

use crate::model::item::ItemId;
use crate::model::progress::{ItemProgressDelta, ItemProgressInput};
use crate::model::user::UserId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type TaskId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    /// Sort weight; higher means more urgent.
    pub fn rank(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// Task lifecycle state. Serialized in kebab-case (`in-progress`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    /// Only reachable through an explicit status set.
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "in-progress" | "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

/// Checklist entry linking a task to a catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskItem {
    pub item_id: ItemId,
    /// Catalog name captured when the task was created. Survives deletion of
    /// the catalog entry.
    #[serde(default)]
    pub item_name: String,
    /// Target quantity.
    pub quantity: u32,
    #[serde(default)]
    pub completed_quantity: u32,
}

impl TaskItem {
    /// Creates an untouched checklist entry.
    pub fn new(item_id: ItemId, item_name: impl Into<String>, quantity: u32) -> Self {
        Self {
            item_id,
            item_name: item_name.into(),
            quantity,
            completed_quantity: 0,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completed_quantity >= self.quantity
    }

    /// Adds `amount` to the completed quantity, clamped to the target.
    ///
    /// Returns `(previous, new)` completed totals.
    pub fn apply_increment(&mut self, amount: u32) -> (u32, u32) {
        let previous = self.completed_quantity;
        self.completed_quantity = previous.saturating_add(amount).min(self.quantity);
        (previous, self.completed_quantity)
    }

    /// Completion percentage, capped at 100.
    pub fn progress_percent(&self) -> u8 {
        if self.quantity == 0 {
            return 0;
        }
        let percent = u64::from(self.completed_quantity) * 100 / u64::from(self.quantity);
        percent.min(100) as u8
    }
}

/// Persisted task record with its owned checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub description: String,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    #[serde(default)]
    pub assigned_to: Option<UserId>,
    /// Assignee email resolved when the assignee was last set.
    #[serde(default)]
    pub assigned_to_email: Option<String>,
    pub created_by: UserId,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub items: Vec<TaskItem>,
}

impl Task {
    /// Checks checklist invariants before persistence.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.description.trim().is_empty() {
            return Err(TaskValidationError::EmptyDescription);
        }
        validate_items(&self.items)
    }

    /// Applies clamped increments by catalog item id and re-derives status.
    ///
    /// Increments naming an item that is not on the checklist are skipped and
    /// produce no delta.
    pub fn apply_progress(&mut self, updates: &[ItemProgressInput]) -> Vec<ItemProgressDelta> {
        let mut deltas = Vec::with_capacity(updates.len());
        for update in updates {
            let Some(item) = self
                .items
                .iter_mut()
                .find(|item| item.item_id == update.item_id)
            else {
                continue;
            };
            let (previous, new_total) = item.apply_increment(update.quantity_added);
            deltas.push(ItemProgressDelta {
                item_id: item.item_id,
                item_name: item.item_name.clone(),
                quantity_added: update.quantity_added,
                previous_completed: previous,
                new_total,
            });
        }

        self.rederive_status();
        deltas
    }

    /// Replaces status with the one derived from the checklist.
    pub fn rederive_status(&mut self) {
        self.status = derive_status(&self.items);
    }

    /// Aggregated completion numbers for display.
    pub fn progress(&self) -> TaskProgress {
        let completed_quantity = self
            .items
            .iter()
            .map(|item| u64::from(item.completed_quantity))
            .sum();
        let target_quantity = self
            .items
            .iter()
            .map(|item| u64::from(item.quantity))
            .sum();
        TaskProgress {
            task_id: self.id,
            status: self.status,
            items_total: self.items.len(),
            items_completed: self.items.iter().filter(|item| item.is_complete()).count(),
            completed_quantity,
            target_quantity,
        }
    }
}

/// Derives task status from checklist state.
///
/// - every item complete -> `Completed` (vacuously so for an empty checklist)
/// - any item started -> `InProgress`
/// - otherwise -> `Pending`
pub fn derive_status(items: &[TaskItem]) -> TaskStatus {
    if items.iter().all(TaskItem::is_complete) {
        TaskStatus::Completed
    } else if items.iter().any(|item| item.completed_quantity > 0) {
        TaskStatus::InProgress
    } else {
        TaskStatus::Pending
    }
}

/// Checks quantity bounds and uniqueness of a checklist.
pub fn validate_items(items: &[TaskItem]) -> Result<(), TaskValidationError> {
    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        if item.quantity == 0 {
            return Err(TaskValidationError::ZeroQuantity {
                item_id: item.item_id,
            });
        }
        if item.completed_quantity > item.quantity {
            return Err(TaskValidationError::CompletedExceedsQuantity {
                item_id: item.item_id,
                completed: item.completed_quantity,
                quantity: item.quantity,
            });
        }
        if !seen.insert(item.item_id) {
            return Err(TaskValidationError::DuplicateItem {
                item_id: item.item_id,
            });
        }
    }
    Ok(())
}

/// Task-level completion summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TaskProgress {
    pub task_id: TaskId,
    pub status: TaskStatus,
    pub items_total: usize,
    pub items_completed: usize,
    pub completed_quantity: u64,
    pub target_quantity: u64,
}

impl TaskProgress {
    /// Overall completion percentage across all checklist quantities.
    pub fn percent(&self) -> u8 {
        if self.target_quantity == 0 {
            return 0;
        }
        (self.completed_quantity * 100 / self.target_quantity).min(100) as u8
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    EmptyDescription,
    ZeroQuantity {
        item_id: ItemId,
    },
    CompletedExceedsQuantity {
        item_id: ItemId,
        completed: u32,
        quantity: u32,
    },
    DuplicateItem {
        item_id: ItemId,
    },
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyDescription => write!(f, "task description cannot be empty"),
            Self::ZeroQuantity { item_id } => {
                write!(f, "task item {item_id} must have a positive quantity")
            }
            Self::CompletedExceedsQuantity {
                item_id,
                completed,
                quantity,
            } => write!(
                f,
                "task item {item_id} has completed_quantity {completed} above quantity {quantity}"
            ),
            Self::DuplicateItem { item_id } => {
                write!(f, "task item {item_id} appears more than once")
            }
        }
    }
}

impl Error for TaskValidationError {}

#[cfg(test)]
mod tests {
    use super::{derive_status, validate_items, Task, TaskItem, TaskPriority, TaskStatus};
    use crate::model::progress::ItemProgressInput;
    use chrono::Utc;

    fn task_with(items: Vec<TaskItem>) -> Task {
        let now = Utc::now();
        Task {
            id: 1,
            title: None,
            description: "restock".to_string(),
            priority: TaskPriority::Medium,
            status: TaskStatus::Pending,
            assigned_to: None,
            assigned_to_email: None,
            created_by: 1,
            due_date: None,
            created_at: now,
            updated_at: now,
            items,
        }
    }

    fn item(item_id: i64, quantity: u32, completed: u32) -> TaskItem {
        TaskItem {
            item_id,
            item_name: format!("item-{item_id}"),
            quantity,
            completed_quantity: completed,
        }
    }

    #[test]
    fn derive_status_follows_item_completion() {
        assert_eq!(
            derive_status(&[item(1, 5, 0), item(2, 3, 0)]),
            TaskStatus::Pending
        );
        assert_eq!(
            derive_status(&[item(1, 5, 1), item(2, 3, 0)]),
            TaskStatus::InProgress
        );
        assert_eq!(
            derive_status(&[item(1, 5, 5), item(2, 3, 0)]),
            TaskStatus::InProgress
        );
        assert_eq!(
            derive_status(&[item(1, 5, 5), item(2, 3, 3)]),
            TaskStatus::Completed
        );
    }

    #[test]
    fn empty_checklist_derives_completed() {
        assert_eq!(derive_status(&[]), TaskStatus::Completed);

        let mut task = task_with(Vec::new());
        task.status = TaskStatus::Cancelled;
        let deltas = task.apply_progress(&[]);
        assert!(deltas.is_empty());
        assert_eq!(task.status, TaskStatus::Completed);
    }

    #[test]
    fn increments_clamp_to_target() {
        let mut entry = item(1, 10, 4);
        assert_eq!(entry.apply_increment(8), (4, 10));
        assert_eq!(entry.apply_increment(u32::MAX), (10, 10));
        assert_eq!(entry.progress_percent(), 100);
    }

    #[test]
    fn apply_progress_skips_unknown_items_and_rederives() {
        let mut task = task_with(vec![item(1, 10, 0), item(2, 2, 0)]);
        let deltas = task.apply_progress(&[
            ItemProgressInput::new(1, 4),
            ItemProgressInput::new(99, 1),
        ]);

        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].previous_completed, 0);
        assert_eq!(deltas[0].new_total, 4);
        assert_eq!(task.status, TaskStatus::InProgress);

        let progress = task.progress();
        assert_eq!(progress.items_completed, 0);
        assert_eq!(progress.completed_quantity, 4);
        assert_eq!(progress.target_quantity, 12);
        assert_eq!(progress.percent(), 33);

        task.apply_progress(&[ItemProgressInput::new(1, 6), ItemProgressInput::new(2, 2)]);
        assert_eq!(task.status, TaskStatus::Completed);
        let before = task.status;
        task.rederive_status();
        assert_eq!(task.status, before);
    }

    #[test]
    fn explicit_override_is_replaced_by_next_progress_update() {
        let mut task = task_with(vec![item(1, 3, 1)]);
        task.status = TaskStatus::Cancelled;
        task.apply_progress(&[ItemProgressInput::new(1, 1)]);
        assert_eq!(task.status, TaskStatus::InProgress);
    }

    #[test]
    fn validate_items_rejects_bad_quantities_and_duplicates() {
        assert!(validate_items(&[item(1, 0, 0)]).is_err());
        assert!(validate_items(&[item(1, 2, 3)]).is_err());
        assert!(validate_items(&[item(1, 2, 0), item(1, 4, 0)]).is_err());
        assert!(validate_items(&[item(1, 2, 2), item(2, 4, 0)]).is_ok());
    }

    #[test]
    fn status_and_priority_use_wire_names() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"in-progress\""
        );
        assert_eq!(
            serde_json::to_string(&TaskPriority::High).unwrap(),
            "\"high\""
        );
        assert_eq!(TaskStatus::parse("In-Progress"), Some(TaskStatus::InProgress));
        assert_eq!(TaskPriority::parse("Medium"), Some(TaskPriority::Medium));
    }
}
