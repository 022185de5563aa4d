use serde::Deserialize;
use serde_json::{Value, json};
use taskboard_model::{
    CategoryId, CreateTaskRequest, Task, TaskFilter, TaskId, TaskPriority, TaskSortField,
    TaskStatus, UpdateTaskRequest, wire,
};
use taskboard_store::{Row, Select};

use super::{Resource, decode_row, into_row};
use crate::error::PipelineError;

/// The `tasks` table.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tasks;

#[derive(Deserialize)]
struct TaskRow {
    id: String,
    title: String,
    #[serde(default)]
    description: Option<String>,
    due_date: String,
    #[serde(default)]
    status: Option<TaskStatus>,
    #[serde(default)]
    priority: Option<TaskPriority>,
    #[serde(default)]
    category_id: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<TaskRow> for Task {
    type Error = PipelineError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        Ok(Task {
            id: TaskId::from(row.id),
            title: row.title,
            description: row.description.unwrap_or_default(),
            due_date: wire::parse_date(&row.due_date).map_err(decode_error)?,
            status: row.status.unwrap_or_default(),
            priority: row.priority.unwrap_or_default(),
            category_id: row.category_id.map(CategoryId::from),
            created_at: wire::parse_timestamp(&row.created_at).map_err(decode_error)?,
            updated_at: wire::parse_timestamp(&row.updated_at).map_err(decode_error)?,
        })
    }
}

fn decode_error(e: taskboard_model::ModelError) -> PipelineError {
    PipelineError::Decode {
        entity: Tasks::TABLE,
        reason: e.to_string(),
    }
}

impl Resource for Tasks {
    type Entity = Task;
    type Id = TaskId;
    type Filter = TaskFilter;
    type SortField = TaskSortField;
    type Create = CreateTaskRequest;
    type Update = UpdateTaskRequest;

    const TABLE: &'static str = "tasks";

    fn apply_filter(mut select: Select, filter: &TaskFilter) -> Select {
        if let Some(status) = filter.status {
            select = select.eq("status", status.as_str());
        }
        if let Some(priority) = filter.priority {
            select = select.eq("priority", priority.as_str());
        }
        if let Some(category) = &filter.category_id {
            select = select.eq("category_id", category.as_str());
        }
        if let Some(title) = filter.title.as_deref().filter(|t| !t.is_empty()) {
            select = select.ilike("title", title);
        }
        if let Some(from) = filter.date_from {
            select = select.gte("due_date", wire::format_date(from));
        }
        if let Some(to) = filter.date_to {
            select = select.lte("due_date", wire::format_date(to));
        }
        select
    }

    fn merge_search(filter: &TaskFilter, text: &str) -> TaskFilter {
        filter.clone().with_title(text)
    }

    fn entity_id(task: &Task) -> &TaskId {
        &task.id
    }

    fn decode(row: Row) -> Result<Task, PipelineError> {
        decode_row::<TaskRow>(Self::TABLE, row)?.try_into()
    }

    fn encode_create(payload: &CreateTaskRequest) -> Row {
        into_row(json!({
            "title": payload.title,
            "description": payload.description.clone().unwrap_or_default(),
            "due_date": wire::format_date(payload.due_date),
            "status": payload.status.unwrap_or_default().as_str(),
            "priority": payload.priority.unwrap_or_default().as_str(),
            "category_id": payload.category_id.as_ref().map(|c| c.as_str()),
        }))
    }

    fn encode_update(patch: &UpdateTaskRequest) -> Row {
        let mut row = Row::new();
        if let Some(title) = &patch.title {
            row.insert("title".into(), Value::from(title.as_str()));
        }
        if let Some(description) = &patch.description {
            row.insert("description".into(), Value::from(description.as_str()));
        }
        if let Some(due) = patch.due_date {
            row.insert("due_date".into(), Value::from(wire::format_date(due)));
        }
        if let Some(status) = patch.status {
            row.insert("status".into(), Value::from(status.as_str()));
        }
        if let Some(priority) = patch.priority {
            row.insert("priority".into(), Value::from(priority.as_str()));
        }
        if let Some(category) = &patch.category_id {
            let value = category
                .as_ref()
                .map_or(Value::Null, |c| Value::from(c.as_str()));
            row.insert("category_id".into(), value);
        }
        row
    }
}
