use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::wire::timestamp_serde;
use crate::{CategoryId, Task, TaskSummary};

/// Label shown for tasks whose category cannot be resolved.
pub const UNKNOWN_CATEGORY: &str = "Unknown category";

/// A named, coloured grouping of tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub title: String,
    pub description: String,
    /// CSS colour, e.g. `#2563eb`.
    pub color: String,
    #[serde(with = "timestamp_serde")]
    pub created_at: OffsetDateTime,
    #[serde(with = "timestamp_serde")]
    pub updated_at: OffsetDateTime,
    /// Related tasks, only populated by paginated category queries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<TaskSummary>,
}

/// Resolve the display title of a task's category.
///
/// Tasks may point at categories that were deleted after the fact; those
/// resolve to [`UNKNOWN_CATEGORY`] just like tasks without a category.
pub fn category_label<'a>(task: &Task, categories: &'a [Category]) -> &'a str {
    task.category_id
        .as_ref()
        .and_then(|id| categories.iter().find(|c| &c.id == id))
        .map(|c| c.title.as_str())
        .unwrap_or(UNKNOWN_CATEGORY)
}
