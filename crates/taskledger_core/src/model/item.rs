//! Catalog items referenced by task checklists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type ItemId = i64;

/// Catalog seeded into an empty store, in id order.
pub const DEFAULT_ITEMS: [(&str, &str); 5] = [
    ("Research Hours", "Research and analysis tasks"),
    ("Development Hours", "Software development tasks"),
    ("Testing Sessions", "Quality assurance and testing"),
    ("Documentation Pages", "Documentation and writing"),
    ("Review Items", "Code and content review"),
];

/// Reusable named unit of work (e.g. "Research Hours").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
    /// Set by the first update; `None` for untouched entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}
