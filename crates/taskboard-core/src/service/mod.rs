use std::sync::Arc;

use taskboard_model::{CategoryId, PageSpec, Sort, SortField, Task, TaskSortField};
use taskboard_store::Store;
use tokio::{
    runtime::{Handle, RuntimeFlavor},
    sync::{mpsc, watch},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::EntityCache;
use crate::composer::QueryComposer;
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::event::{Observers, PipelineObserver};
use crate::executor::{OperationStatus, QueryExecutor, Snapshot};
use crate::mutation::MutationGateway;
use crate::resource::{Categories, Descriptor, Resource, Tasks};
use crate::search::SearchDebouncer;
use crate::view::ViewStateStore;

pub type TaskService = Service<Tasks>;
pub type CategoryService = Service<Categories>;

/// Reactive pipeline for one entity type.
///
/// Owns the view state and spawns the debouncer, composer and executor on
/// the current runtime, which must be a current-thread one: setter calls made
/// without an `.await` in between then reach the composer as one burst. Use
/// [`update`](Self::update) to change several inputs from any thread.
/// Dropping the service stops the stages.
pub struct Service<R: Resource> {
    view: Arc<ViewStateStore<R>>,
    executor: QueryExecutor<R>,
    cache: EntityCache<R>,
    mutations: MutationGateway<R>,
    store: Arc<dyn Store>,
    token: CancellationToken,
}

impl<R: Resource> Service<R> {
    /// Fails with [`PipelineError::UnsupportedRuntime`] outside a
    /// current-thread tokio runtime.
    pub fn new(store: Arc<dyn Store>, config: &PipelineConfig) -> Result<Self, PipelineError> {
        Self::with_observers(store, config, Vec::new())
    }

    pub fn with_observers(
        store: Arc<dyn Store>,
        config: &PipelineConfig,
        observers: Vec<Arc<dyn PipelineObserver>>,
    ) -> Result<Self, PipelineError> {
        match Handle::try_current().map(|h| h.runtime_flavor()) {
            Ok(RuntimeFlavor::CurrentThread) => {}
            Ok(flavor) => {
                warn!(entity = R::TABLE, ?flavor, "refusing to start pipeline");
                return Err(PipelineError::UnsupportedRuntime);
            }
            Err(_) => return Err(PipelineError::UnsupportedRuntime),
        }

        let observers = Observers::new(observers);
        let status = OperationStatus::new();
        let token = CancellationToken::new();

        let (view, search) = ViewStateStore::<R>::new(PageSpec::new(1, config.page_size));
        let view = Arc::new(view);

        let executor =
            QueryExecutor::with_observers(Arc::clone(&store), status.clone(), observers.clone());
        let (descriptors_tx, descriptors_rx) = mpsc::unbounded_channel();

        let debouncer = SearchDebouncer::new(Arc::clone(&view), config.debounce)
            .with_observers(observers.clone());
        tokio::spawn(debouncer.run(search, token.child_token()));

        let composer = QueryComposer::new(&view).with_observers(observers.clone());
        tokio::spawn(composer.run(descriptors_tx, token.child_token()));
        tokio::spawn(executor.clone().run(descriptors_rx, token.child_token()));

        info!(entity = R::TABLE, debounce = ?config.debounce, page_size = config.page_size, "pipeline started");
        Ok(Self {
            view,
            cache: EntityCache::with_observers(Arc::clone(&store), observers.clone()),
            mutations: MutationGateway::with_observers(Arc::clone(&store), status, observers),
            executor,
            store,
            token,
        })
    }

    pub fn set_filter(&self, filter: R::Filter) {
        self.view.set_filter(filter);
    }

    pub fn set_sort(&self, sort: Sort<R::SortField>) {
        self.view.set_sort(sort);
    }

    pub fn set_pagination(&self, page: PageSpec) {
        self.view.set_pagination(page);
    }

    /// Change filter, sort and pagination together; one query runs.
    pub fn set_view(&self, edit: impl FnOnce(&mut Descriptor<R>)) {
        self.view.update(edit);
    }

    /// Raw search text; merged into the filter once typing pauses.
    pub fn set_search(&self, text: impl Into<String>) {
        self.view.set_search(text);
    }

    /// Re-run the current query even if nothing changed.
    pub fn refresh(&self) {
        self.view.refresh();
    }

    pub fn filter(&self) -> R::Filter {
        self.view.filter()
    }

    pub fn sort(&self) -> Sort<R::SortField> {
        self.view.sort()
    }

    pub fn pagination(&self) -> PageSpec {
        self.view.pagination()
    }

    /// Descriptor the next query will run with.
    pub fn descriptor(&self) -> Descriptor<R> {
        self.view.descriptor()
    }

    /// Stream of published query snapshots. `None` until the first query lands.
    pub fn results(&self) -> watch::Receiver<Option<Snapshot<R>>> {
        self.executor.results()
    }

    pub fn latest(&self) -> Option<Snapshot<R>> {
        self.executor.latest()
    }

    pub fn loading(&self) -> watch::Receiver<bool> {
        self.executor.status().loading()
    }

    pub fn error(&self) -> watch::Receiver<Option<String>> {
        self.executor.status().error()
    }

    pub fn is_loading(&self) -> bool {
        self.executor.status().is_loading()
    }

    pub fn last_error(&self) -> Option<String> {
        self.executor.status().last_error()
    }

    pub async fn create(&self, payload: &R::Create) -> Result<R::Entity, PipelineError> {
        self.mutations.create(payload).await
    }

    pub async fn update(&self, id: &R::Id, patch: &R::Update) -> Result<R::Entity, PipelineError> {
        self.mutations.update(id, patch).await
    }

    pub async fn delete(&self, id: &R::Id) -> Result<(), PipelineError> {
        self.mutations.delete(id).await
    }

    /// Whole collection through the cache.
    pub async fn get_all(&self) -> Result<Arc<Vec<R::Entity>>, PipelineError> {
        self.cache.get_all().await
    }

    pub fn cache(&self) -> &EntityCache<R> {
        &self.cache
    }

    /// Fetch one entity straight from the store.
    ///
    /// Leaves the pipeline's loading flag and error alone.
    pub async fn get_by_id(&self, id: &R::Id) -> Result<Option<R::Entity>, PipelineError> {
        let select = R::select().eq("id", id.as_ref()).limit(1);
        let rows = self.store.select(&select).await?;
        rows.rows.into_iter().next().map(R::decode).transpose()
    }

    /// Stop the background tasks and abandon queries in flight.
    pub fn shutdown(&self) {
        if !self.token.is_cancelled() {
            debug!(entity = R::TABLE, "pipeline shutting down");
        }
        self.token.cancel();
        self.executor.cancel();
    }
}

impl Service<Tasks> {
    /// Tasks of one category ordered by title, straight from the store.
    pub async fn tasks_by_category(&self, category: &CategoryId) -> Result<Vec<Task>, PipelineError> {
        let select = Tasks::select()
            .eq("category_id", category.as_str())
            .order(TaskSortField::Title.column(), true);
        let rows = self.store.select(&select).await?;
        Tasks::decode_all(rows.rows)
    }
}

impl<R: Resource> Drop for Service<R> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::testing::{category_json, seed_tasks, task_in_category, titles, wait_snapshot};
    use taskboard_model::{
        CreateTaskRequest, TaskFilter, TaskId, TaskPriority, TaskStatus, UNKNOWN_CATEGORY,
        category_label,
    };
    use taskboard_store::MemoryStore;
    use time::macros::date;

    fn service<R: Resource>(store: &MemoryStore) -> Service<R> {
        Service::new(Arc::new(store.clone()), &PipelineConfig::default()).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn first_page_is_published_on_start() {
        let store = MemoryStore::new();
        seed_tasks(&store, &["B", "A", "C"]);
        let tasks = service::<Tasks>(&store);
        let mut results = tasks.results();

        let snapshot = wait_snapshot(&mut results, 1).await;
        let result = snapshot.outcome.unwrap();
        assert_eq!(titles(&result), ["A", "B", "C"]);
        assert_eq!(result.total_pages, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn filter_and_pagination_drive_queries() {
        let store = MemoryStore::new();
        seed_tasks(&store, &["B", "A", "C"]);
        let tasks = service::<Tasks>(&store);
        let mut results = tasks.results();
        wait_snapshot(&mut results, 1).await;

        tasks.set_filter(TaskFilter::new().with_title("b"));
        let snapshot = wait_snapshot(&mut results, 2).await;
        assert_eq!(titles(snapshot.outcome.as_ref().unwrap()), ["B"]);

        tasks.set_filter(TaskFilter::default());
        tasks.set_pagination(PageSpec::new(2, 2));
        let snapshot = wait_snapshot(&mut results, 3).await;
        let result = snapshot.outcome.unwrap();
        assert_eq!(titles(&result), ["C"]);
        assert_eq!(result.page, 2);
        assert_eq!(result.total, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn search_runs_one_query_after_typing_stops() {
        let store = MemoryStore::new();
        seed_tasks(&store, &["Report", "Review", "Shopping"]);
        let tasks = service::<Tasks>(&store);
        let mut results = tasks.results();
        wait_snapshot(&mut results, 1).await;
        let before = store.calls().select;

        for text in ["R", "Re", "Rep"] {
            tasks.set_search(text);
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        let snapshot = wait_snapshot(&mut results, 2).await;

        assert_eq!(titles(snapshot.outcome.as_ref().unwrap()), ["Report"]);
        assert_eq!(store.calls().select, before + 1);
        assert_eq!(tasks.filter().title.as_deref(), Some("Rep"));
    }

    #[tokio::test(start_paused = true)]
    async fn reapplied_pagination_shows_created_row() {
        let store = MemoryStore::new();
        let tasks = service::<Tasks>(&store);
        let mut results = tasks.results();
        let first = wait_snapshot(&mut results, 1).await;
        assert!(first.outcome.unwrap().rows.is_empty());

        let request = CreateTaskRequest::new("Write report", date!(2024 - 05 - 01))
            .with_description("Quarterly numbers")
            .with_status(TaskStatus::InProgress)
            .with_priority(TaskPriority::High)
            .with_category("work");
        let created = tasks.create(&request).await.unwrap();

        let before = store.calls().select;
        tasks.set_pagination(tasks.pagination());
        let snapshot = wait_snapshot(&mut results, 2).await;
        assert_eq!(store.calls().select, before + 1);

        let result = snapshot.outcome.unwrap();
        assert_eq!(result.rows.len(), 1);
        let row = &result.rows[0];
        assert_eq!(row.id, created.id);
        assert_eq!(row.title, request.title);
        assert_eq!(Some(&row.description), request.description.as_ref());
        assert_eq!(row.due_date, request.due_date);
        assert_eq!(Some(row.status), request.status);
        assert_eq!(Some(row.priority), request.priority);
        assert_eq!(row.category_id, request.category_id);
    }

    #[tokio::test(start_paused = true)]
    async fn setter_burst_runs_one_query() {
        let store = MemoryStore::new();
        seed_tasks(&store, &["A", "B"]);
        let tasks = service::<Tasks>(&store);
        let mut results = tasks.results();
        wait_snapshot(&mut results, 1).await;

        for i in 0..50u32 {
            let before = store.calls().select;
            tasks.set_filter(TaskFilter::new().with_status(TaskStatus::ToDo));
            tasks.set_sort(Sort::desc(TaskSortField::DueDate));
            tasks.set_pagination(PageSpec::new(i + 2, 10));
            tokio::time::sleep(Duration::from_millis(20)).await;

            assert_eq!(store.calls().select, before + 1);
            let latest = tasks.latest().unwrap();
            assert_eq!(latest.descriptor, tasks.descriptor());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn set_view_changes_inputs_together() {
        let store = MemoryStore::new();
        seed_tasks(&store, &["A", "B", "C"]);
        let tasks = service::<Tasks>(&store);
        let mut results = tasks.results();
        wait_snapshot(&mut results, 1).await;

        tasks.set_view(|d| {
            d.sort = Sort::desc(TaskSortField::Title);
            d.page = PageSpec::new(1, 2);
        });
        let snapshot = wait_snapshot(&mut results, 2).await;
        assert_eq!(titles(snapshot.outcome.as_ref().unwrap()), ["C", "B"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn multi_thread_runtime_is_rejected() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let started = Service::<Tasks>::new(store, &PipelineConfig::default());
        assert!(matches!(started, Err(PipelineError::UnsupportedRuntime)));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_query_surfaces_on_error_stream() {
        let store = MemoryStore::new();
        store.fail_next("JWT expired");
        let tasks = service::<Tasks>(&store);
        let mut results = tasks.results();

        let snapshot = wait_snapshot(&mut results, 1).await;
        assert!(snapshot.outcome.is_err());
        assert_eq!(tasks.last_error().as_deref(), Some("JWT expired"));
        assert!(!tasks.is_loading());

        tasks.refresh();
        let snapshot = wait_snapshot(&mut results, 2).await;
        assert!(snapshot.outcome.is_ok());
        assert_eq!(tasks.last_error(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn categories_embed_their_tasks() {
        let store = MemoryStore::new();
        store.seed("categories", [category_json("home", "Home"), category_json("work", "Work")]);
        store.seed(
            "tasks",
            [
                task_in_category("t1", "Report", "work"),
                task_in_category("t2", "Slides", "work"),
                task_in_category("t3", "Milk", "home"),
            ],
        );
        let categories = service::<Categories>(&store);
        let mut results = categories.results();

        let snapshot = wait_snapshot(&mut results, 1).await;
        let result = snapshot.outcome.unwrap();
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.rows[0].title, "Home");
        assert_eq!(result.rows[1].tasks.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn dangling_category_renders_unknown() {
        let store = MemoryStore::new();
        store.seed("categories", [category_json("work", "Work")]);
        store.seed(
            "tasks",
            [
                task_in_category("t1", "Report", "work"),
                task_in_category("t2", "Orphan", "deleted"),
            ],
        );
        let tasks = service::<Tasks>(&store);
        let categories = service::<Categories>(&store);

        let all_tasks = tasks.get_all().await.unwrap();
        let all_categories = categories.get_all().await.unwrap();
        let labels: Vec<_> = all_tasks
            .iter()
            .map(|t| category_label(t, &all_categories))
            .collect();
        assert_eq!(labels, [UNKNOWN_CATEGORY, "Work"]);
    }

    #[tokio::test(start_paused = true)]
    async fn direct_reads_skip_the_pipeline_state() {
        let store = MemoryStore::new();
        store.seed(
            "tasks",
            [
                task_in_category("t1", "Report", "work"),
                task_in_category("t2", "Agenda", "work"),
                task_in_category("t3", "Milk", "home"),
            ],
        );
        let tasks = service::<Tasks>(&store);
        let mut results = tasks.results();
        wait_snapshot(&mut results, 1).await;

        let found = tasks.get_by_id(&TaskId::from("t3")).await.unwrap().unwrap();
        assert_eq!(found.title, "Milk");
        assert!(tasks.get_by_id(&TaskId::from("nope")).await.unwrap().is_none());

        let work = tasks.tasks_by_category(&CategoryId::from("work")).await.unwrap();
        let names: Vec<_> = work.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(names, ["Agenda", "Report"]);
        assert!(!tasks.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_publication() {
        let store = MemoryStore::new();
        seed_tasks(&store, &["A"]);
        let tasks = service::<Tasks>(&store);
        let mut results = tasks.results();
        wait_snapshot(&mut results, 1).await;

        tasks.shutdown();
        tasks.refresh();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(tasks.latest().unwrap().seq, 1);
    }
}
