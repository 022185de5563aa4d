use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::wire::{date_serde, timestamp_serde};
use crate::{CategoryId, TaskId, TaskPriority, TaskStatus};

/// A unit of work tracked on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Store-assigned identifier.
    pub id: TaskId,
    pub title: String,
    /// Free text, empty when the store has none.
    pub description: String,
    #[serde(with = "date_serde")]
    pub due_date: Date,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    /// Weak reference to the owning category.
    ///
    /// Deleting the category leaves this dangling; see [`crate::category_label`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
    #[serde(with = "timestamp_serde")]
    pub created_at: OffsetDateTime,
    #[serde(with = "timestamp_serde")]
    pub updated_at: OffsetDateTime,
}

/// Reduced task view embedded in category listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    pub id: TaskId,
    pub title: String,
    pub status: TaskStatus,
    #[serde(with = "date_serde")]
    pub due_date: Date,
    pub priority: TaskPriority,
}

impl Task {
    pub fn summary(&self) -> TaskSummary {
        TaskSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            status: self.status,
            due_date: self.due_date,
            priority: self.priority,
        }
    }

    /// Returns `true` if the due date is before `today` and the task is not done.
    pub fn is_overdue(&self, today: Date) -> bool {
        !self.status.is_done() && self.due_date < today
    }
}
