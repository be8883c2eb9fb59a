//! Progress increments and the audit records they produce.

use crate::model::item::ItemId;
use crate::model::task::TaskId;
use crate::model::user::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ProgressUpdateId = Uuid;

/// One requested increment against a checklist item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemProgressInput {
    pub item_id: ItemId,
    pub quantity_added: u32,
}

impl ItemProgressInput {
    pub fn new(item_id: ItemId, quantity_added: u32) -> Self {
        Self {
            item_id,
            quantity_added,
        }
    }
}

/// Applied change to one checklist item, as recorded in the audit log.
///
/// `quantity_added` is the requested amount; `new_total - previous_completed`
/// is smaller when the increment was clamped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemProgressDelta {
    pub item_id: ItemId,
    pub item_name: String,
    pub quantity_added: u32,
    pub previous_completed: u32,
    pub new_total: u32,
}

/// Immutable audit entry for one progress submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdateRecord {
    pub id: ProgressUpdateId,
    pub task_id: TaskId,
    pub task_description: String,
    pub updated_by: UserId,
    pub updated_at: DateTime<Utc>,
    pub item_updates: Vec<ItemProgressDelta>,
}
