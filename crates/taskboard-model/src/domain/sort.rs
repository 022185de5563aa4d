use std::{cmp::Ordering, fmt::Debug};

use crate::{Category, Task};

/// Direction of a sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Closed set of sortable fields for one entity type.
///
/// Each tag maps to a store column and carries its own comparator, so sorting
/// never goes through dynamic field lookup.
pub trait SortField: Copy + Eq + Debug + Send + Sync + 'static {
    type Entity;

    /// Column name on the store side.
    fn column(self) -> &'static str;

    /// Ascending comparison of two entities by this field.
    fn compare(self, a: &Self::Entity, b: &Self::Entity) -> Ordering;
}

/// Fields tasks can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TaskSortField {
    #[default]
    Title,
    DueDate,
    Status,
    Priority,
    CreatedAt,
}

/// Fields categories can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CategorySortField {
    #[default]
    Title,
    CreatedAt,
}

impl SortField for TaskSortField {
    type Entity = Task;

    fn column(self) -> &'static str {
        match self {
            TaskSortField::Title => "title",
            TaskSortField::DueDate => "due_date",
            TaskSortField::Status => "status",
            TaskSortField::Priority => "priority",
            TaskSortField::CreatedAt => "created_at",
        }
    }

    fn compare(self, a: &Task, b: &Task) -> Ordering {
        match self {
            TaskSortField::Title => a.title.cmp(&b.title),
            TaskSortField::DueDate => a.due_date.cmp(&b.due_date),
            // The store orders the text labels, so do the same here.
            TaskSortField::Status => a.status.as_str().cmp(b.status.as_str()),
            TaskSortField::Priority => a.priority.as_str().cmp(b.priority.as_str()),
            TaskSortField::CreatedAt => a.created_at.cmp(&b.created_at),
        }
    }
}

impl SortField for CategorySortField {
    type Entity = Category;

    fn column(self) -> &'static str {
        match self {
            CategorySortField::Title => "title",
            CategorySortField::CreatedAt => "created_at",
        }
    }

    fn compare(self, a: &Category, b: &Category) -> Ordering {
        match self {
            CategorySortField::Title => a.title.cmp(&b.title),
            CategorySortField::CreatedAt => a.created_at.cmp(&b.created_at),
        }
    }
}

/// A `(field, direction)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Sort<F> {
    pub field: F,
    pub direction: SortDirection,
}

impl<F: SortField> Sort<F> {
    pub fn asc(field: F) -> Self {
        Self {
            field,
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: F) -> Self {
        Self {
            field,
            direction: SortDirection::Desc,
        }
    }

    pub fn is_ascending(&self) -> bool {
        self.direction == SortDirection::Asc
    }

    pub fn compare(&self, a: &F::Entity, b: &F::Entity) -> Ordering {
        let ord = self.field.compare(a, b);
        match self.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    }

    /// Stable in-place sort of a slice of entities.
    pub fn apply(&self, items: &mut [F::Entity]) {
        items.sort_by(|a, b| self.compare(a, b));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TaskId, TaskPriority, TaskStatus};
    use time::macros::{date, datetime};

    fn task(title: &str, status: TaskStatus) -> Task {
        Task {
            id: TaskId::from(title),
            title: title.to_string(),
            description: String::new(),
            due_date: date!(2024 - 05 - 01),
            status,
            priority: TaskPriority::Medium,
            category_id: None,
            created_at: datetime!(2024-01-01 00:00 UTC),
            updated_at: datetime!(2024-01-01 00:00 UTC),
        }
    }

    #[test]
    fn columns_use_snake_case() {
        assert_eq!(TaskSortField::DueDate.column(), "due_date");
        assert_eq!(TaskSortField::CreatedAt.column(), "created_at");
        assert_eq!(CategorySortField::CreatedAt.column(), "created_at");
    }

    #[test]
    fn default_sort_is_title_ascending() {
        let sort = Sort::<TaskSortField>::default();
        assert_eq!(sort.field, TaskSortField::Title);
        assert!(sort.is_ascending());
    }

    #[test]
    fn descending_reverses_comparator() {
        let mut items = vec![
            task("B", TaskStatus::Done),
            task("A", TaskStatus::ToDo),
            task("C", TaskStatus::InProgress),
        ];

        Sort::desc(TaskSortField::Title).apply(&mut items);
        let titles: Vec<_> = items.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["C", "B", "A"]);

        Sort::asc(TaskSortField::Status).apply(&mut items);
        let statuses: Vec<_> = items.iter().map(|t| t.status).collect();
        assert_eq!(
            statuses,
            [TaskStatus::Done, TaskStatus::InProgress, TaskStatus::ToDo]
        );
    }
}
