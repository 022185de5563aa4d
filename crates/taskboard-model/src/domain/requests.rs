use time::Date;

use crate::{CategoryId, TaskPriority, TaskStatus};

/// Colour assigned to categories created without one.
pub const DEFAULT_CATEGORY_COLOR: &str = "#2563eb";

/// Payload for creating a task. Unset optional fields get store defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Date,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub category_id: Option<CategoryId>,
}

/// Partial task update; only `Some` fields are sent.
///
/// `category_id: Some(None)` detaches the task from its category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<Date>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub category_id: Option<Option<CategoryId>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCategoryRequest {
    pub title: String,
    pub description: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateCategoryRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
}

impl CreateTaskRequest {
    pub fn new(title: impl Into<String>, due_date: Date) -> Self {
        Self {
            title: title.into(),
            description: None,
            due_date,
            status: None,
            priority: None,
            category_id: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
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
}

impl UpdateTaskRequest {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl CreateCategoryRequest {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            color: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

impl UpdateCategoryRequest {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
