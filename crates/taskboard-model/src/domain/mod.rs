mod ids;
pub use ids::{CategoryId, TaskId};

mod task_status;
pub use task_status::{TaskPriority, TaskStatus};

mod task;
pub use task::{Task, TaskSummary};

mod category;
pub use category::{Category, UNKNOWN_CATEGORY, category_label};

mod filter;
pub use filter::{CategoryFilter, TaskFilter};

mod sort;
pub use sort::{CategorySortField, Sort, SortDirection, SortField, TaskSortField};

mod query;
pub use query::{DEFAULT_PAGE_SIZE, PageSpec, QueryDescriptor, QueryResult};

mod requests;
pub use requests::{
    CreateCategoryRequest, CreateTaskRequest, DEFAULT_CATEGORY_COLOR, UpdateCategoryRequest,
    UpdateTaskRequest,
};
