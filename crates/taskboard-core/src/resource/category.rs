use serde::Deserialize;
use serde_json::{Value, json};
use taskboard_model::{
    Category, CategoryFilter, CategoryId, CategorySortField, CreateCategoryRequest,
    DEFAULT_CATEGORY_COLOR, TaskId, TaskPriority, TaskStatus, TaskSummary, UpdateCategoryRequest,
    wire,
};
use taskboard_store::{Embed, Row, Select};

use super::{Resource, decode_row, into_row};
use crate::error::PipelineError;

/// The `categories` table, with each category's tasks embedded.
#[derive(Debug, Clone, Copy, Default)]
pub struct Categories;

const EMBEDDED_TASK_COLUMNS: [&str; 5] = ["id", "title", "status", "due_date", "priority"];

#[derive(Deserialize)]
struct CategoryRow {
    id: String,
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    color: Option<String>,
    created_at: String,
    updated_at: String,
    #[serde(default)]
    tasks: Option<Vec<SummaryRow>>,
}

#[derive(Deserialize)]
struct SummaryRow {
    id: String,
    title: String,
    #[serde(default)]
    status: Option<TaskStatus>,
    due_date: String,
    #[serde(default)]
    priority: Option<TaskPriority>,
}

impl TryFrom<SummaryRow> for TaskSummary {
    type Error = PipelineError;

    fn try_from(row: SummaryRow) -> Result<Self, Self::Error> {
        Ok(TaskSummary {
            id: TaskId::from(row.id),
            title: row.title,
            status: row.status.unwrap_or_default(),
            due_date: wire::parse_date(&row.due_date).map_err(decode_error)?,
            priority: row.priority.unwrap_or_default(),
        })
    }
}

impl TryFrom<CategoryRow> for Category {
    type Error = PipelineError;

    fn try_from(row: CategoryRow) -> Result<Self, Self::Error> {
        let tasks = row
            .tasks
            .unwrap_or_default()
            .into_iter()
            .map(TaskSummary::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Category {
            id: CategoryId::from(row.id),
            title: row.title,
            description: row.description.unwrap_or_default(),
            color: row
                .color
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_CATEGORY_COLOR.to_string()),
            created_at: wire::parse_timestamp(&row.created_at).map_err(decode_error)?,
            updated_at: wire::parse_timestamp(&row.updated_at).map_err(decode_error)?,
            tasks,
        })
    }
}

fn decode_error(e: taskboard_model::ModelError) -> PipelineError {
    PipelineError::Decode {
        entity: Categories::TABLE,
        reason: e.to_string(),
    }
}

impl Resource for Categories {
    type Entity = Category;
    type Id = CategoryId;
    type Filter = CategoryFilter;
    type SortField = CategorySortField;
    type Create = CreateCategoryRequest;
    type Update = UpdateCategoryRequest;

    const TABLE: &'static str = "categories";

    fn embed() -> Option<Embed> {
        Some(Embed {
            table: "tasks".to_string(),
            foreign_key: "category_id".to_string(),
            columns: EMBEDDED_TASK_COLUMNS.iter().map(|c| c.to_string()).collect(),
        })
    }

    fn apply_filter(select: Select, filter: &CategoryFilter) -> Select {
        match filter.title.as_deref().filter(|t| !t.is_empty()) {
            Some(title) => select.ilike("title", title),
            None => select,
        }
    }

    fn merge_search(filter: &CategoryFilter, text: &str) -> CategoryFilter {
        filter.clone().with_title(text)
    }

    fn entity_id(category: &Category) -> &CategoryId {
        &category.id
    }

    fn decode(row: Row) -> Result<Category, PipelineError> {
        decode_row::<CategoryRow>(Self::TABLE, row)?.try_into()
    }

    fn encode_create(payload: &CreateCategoryRequest) -> Row {
        into_row(json!({
            "title": payload.title,
            "description": payload.description.clone().unwrap_or_default(),
            "color": payload
                .color
                .clone()
                .unwrap_or_else(|| DEFAULT_CATEGORY_COLOR.to_string()),
        }))
    }

    fn encode_update(patch: &UpdateCategoryRequest) -> Row {
        let mut row = Row::new();
        if let Some(title) = &patch.title {
            row.insert("title".into(), Value::from(title.as_str()));
        }
        if let Some(description) = &patch.description {
            row.insert("description".into(), Value::from(description.as_str()));
        }
        if let Some(color) = &patch.color {
            row.insert("color".into(), Value::from(color.as_str()));
        }
        row
    }
}
