use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use serde_json::{Value, json};
use taskboard_model::{QueryResult, Task};
use taskboard_store::{MemoryStore, Row};
use tokio::sync::watch;

use crate::event::{EventKind, Observers, PipelineEvent, PipelineObserver};
use crate::executor::QuerySnapshot;
use crate::resource::into_row;

const STAMP: &str = "2024-01-01T00:00:00Z";

#[derive(Default)]
pub(crate) struct Recorder {
    events: Mutex<Vec<PipelineEvent>>,
}

impl Recorder {
    pub(crate) fn observers(self: &Arc<Self>) -> Observers {
        Observers::new(vec![Arc::clone(self) as Arc<dyn PipelineObserver>])
    }

    pub(crate) fn count(&self, kind: EventKind) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.kind == kind)
            .count()
    }
}

impl PipelineObserver for Recorder {
    fn on_event(&self, event: &PipelineEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

pub(crate) fn task_json(id: &str, title: &str, due: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "description": "",
        "due_date": due,
        "status": "To Do",
        "priority": "Medium",
        "category_id": null,
        "created_at": STAMP,
        "updated_at": STAMP,
    })
}

pub(crate) fn task_row(id: &str, title: &str, due: &str) -> Row {
    into_row(task_json(id, title, due))
}

pub(crate) fn task_with_status(id: &str, title: &str, status: &str) -> Value {
    let mut task = task_json(id, title, "2024-03-01");
    task["status"] = json!(status);
    task
}

pub(crate) fn task_in_category(id: &str, title: &str, category: &str) -> Value {
    let mut task = task_json(id, title, "2024-03-01");
    task["category_id"] = json!(category);
    task
}

/// Seed one "To Do" task per title, with id `task-<title>`.
pub(crate) fn seed_tasks(store: &MemoryStore, titles: &[&str]) {
    store.seed(
        "tasks",
        titles
            .iter()
            .map(|title| task_json(&format!("task-{title}"), title, "2024-03-01")),
    );
}

pub(crate) fn category_json(id: &str, title: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "description": "",
        "color": "#16a34a",
        "created_at": STAMP,
        "updated_at": STAMP,
    })
}

pub(crate) fn category_row(id: &str, title: &str) -> Row {
    into_row(category_json(id, title))
}

pub(crate) fn titles(result: &QueryResult<Task>) -> Vec<&str> {
    result.rows.iter().map(|t| t.title.as_str()).collect()
}

/// Wait for a published snapshot with at least sequence number `seq`.
pub(crate) async fn wait_snapshot<F: Clone, S: Clone, E: Clone>(
    rx: &mut watch::Receiver<Option<QuerySnapshot<F, S, E>>>,
    seq: u64,
) -> QuerySnapshot<F, S, E> {
    let found = tokio::time::timeout(
        Duration::from_secs(10),
        rx.wait_for(|s| s.as_ref().is_some_and(|s| s.seq >= seq)),
    )
    .await
    .expect("snapshot not published in time")
    .expect("executor dropped");
    (*found).clone().unwrap()
}
