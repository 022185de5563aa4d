use std::{sync::Arc, time::Duration};

use anyhow::{Context, bail};
use tracing::info;

use taskboard_core::{CategoryService, PipelineConfig, PipelineObserver, TaskService};
use taskboard_model::{Sort, TaskFilter, TaskSortField, TaskStatus, category_label};
use taskboard_observe::{EventLogger, LoggerConfig, init_logger};
use taskboard_prometheus::PrometheusObserver;
use taskboard_store::{RestStore, Store, StoreConfig};

/// Prints the first page of tasks, optionally narrowed to one status and a
/// title search: `board [status] [search]`.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // 1) Logger
    init_logger(&LoggerConfig::from_env()?)?;
    info!("logger initialized");

    // 2) Store
    let store_config = StoreConfig::from_env().context("store configuration")?;
    let store: Arc<dyn Store> = Arc::new(RestStore::new(&store_config)?);
    info!(url = %store_config.url, "store configured");

    // 3) Pipelines
    let metrics = Arc::new(PrometheusObserver::new()?);
    let observers: Vec<Arc<dyn PipelineObserver>> = vec![Arc::new(EventLogger), metrics.clone()];
    let config = PipelineConfig::default();
    let tasks = TaskService::with_observers(Arc::clone(&store), &config, observers.clone())?;
    let categories = CategoryService::with_observers(store, &config, observers)?;

    // 4) Inputs
    let mut args = std::env::args().skip(1);
    let mut filter = TaskFilter::new();
    if let Some(status) = args.next() {
        filter = filter.with_status(status.parse::<TaskStatus>()?);
    }
    tasks.set_view(|d| {
        d.filter = filter;
        d.sort = Sort::asc(TaskSortField::DueDate);
    });
    if let Some(search) = args.next() {
        tasks.set_search(search);
        tokio::time::sleep(config.debounce + Duration::from_millis(50)).await;
    }

    // 5) Wait for the page matching the current inputs
    let expected = tasks.descriptor();
    let mut results = tasks.results();
    let snapshot = tokio::time::timeout(
        Duration::from_secs(30),
        results.wait_for(|s| s.as_ref().is_some_and(|s| s.descriptor == expected)),
    )
    .await
    .context("timed out waiting for tasks")??
    .clone();
    let Some(snapshot) = snapshot else {
        bail!("no result published");
    };
    let page = snapshot.outcome?;
    let all_categories = categories.get_all().await?;

    println!(
        "page {}/{} ({} tasks)",
        page.page,
        page.total_pages.max(1),
        page.total
    );
    for task in &page.rows {
        println!(
            "{}  {:<11}  {:<6}  {:<20}  {}",
            taskboard_model::wire::format_date(task.due_date),
            task.status,
            task.priority,
            category_label(task, &all_categories),
            task.title,
        );
    }

    // 6) Metrics
    println!();
    print!("{}", metrics.render()?);

    tasks.shutdown();
    categories.shutdown();
    Ok(())
}
