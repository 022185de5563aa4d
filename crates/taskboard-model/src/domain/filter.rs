use time::Date;

use crate::{CategoryId, TaskPriority, TaskStatus};

/// Optional predicates narrowing a task query.
///
/// An empty filter (the default) means "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub category_id: Option<CategoryId>,
    /// Case-insensitive substring of the title.
    pub title: Option<String>,
    /// Inclusive lower bound on the due date.
    pub date_from: Option<Date>,
    /// Inclusive upper bound on the due date.
    pub date_to: Option<Date>,
}

/// Optional predicates narrowing a category query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryFilter {
    pub title: Option<String>,
}

impl TaskFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_category(mut self, category_id: impl Into<CategoryId>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = normalize_title(title.into());
        self
    }

    pub fn with_due_between(mut self, from: Option<Date>, to: Option<Date>) -> Self {
        self.date_from = from;
        self.date_to = to;
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl CategoryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = normalize_title(title.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
    }
}

/// Empty search text clears the predicate instead of matching everything with `%%`.
fn normalize_title(title: String) -> Option<String> {
    if title.is_empty() { None } else { Some(title) }
}
