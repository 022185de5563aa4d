use std::{
    cmp::Ordering,
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

use async_trait::async_trait;
use serde_json::Value;
use time::OffsetDateTime;
use tracing::trace;

use taskboard_model::wire::format_timestamp;

use crate::{Embed, Predicate, Row, Rows, Select, Store, StoreError};

/// Number of operations served so far, per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCalls {
    pub select: usize,
    pub insert: usize,
    pub update: usize,
    pub delete: usize,
}

/// In-memory [`Store`].
///
/// Evaluates the same predicates, ordering, ranges, counts and embeds as the
/// remote store. Also lets callers slow responses down, inject one failure or
/// suppress counts, which is what the pipeline tests build on.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryInner>>,
}

#[derive(Default)]
struct MemoryInner {
    /// Rows per table, in insertion order.
    tables: HashMap<String, Vec<Row>>,
    /// Delay applied to every operation, captured when the call starts.
    latency: Duration,
    /// Message of a failure reserved for the next operation.
    fail_next: Option<String>,
    /// Answer count requests with "unknown".
    hide_count: bool,
    calls: StoreCalls,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append rows to a table as-is. Non-object values are skipped.
    pub fn seed<I>(&self, table: &str, rows: I)
    where
        I: IntoIterator<Item = Value>,
    {
        let mut inner = self.write();
        let target = inner.tables.entry(table.to_string()).or_default();
        target.extend(rows.into_iter().filter_map(|row| match row {
            Value::Object(map) => Some(map),
            _ => None,
        }));
    }

    /// Current rows of a table.
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.read().tables.get(table).cloned().unwrap_or_default()
    }

    pub fn set_latency(&self, latency: Duration) {
        self.write().latency = latency;
    }

    /// Make the next operation fail with `message`.
    pub fn fail_next(&self, message: impl Into<String>) {
        self.write().fail_next = Some(message.into());
    }

    pub fn hide_count(&self, hide: bool) {
        self.write().hide_count = hide;
    }

    pub fn calls(&self) -> StoreCalls {
        self.read().calls
    }

    fn read(&self) -> RwLockReadGuard<'_, MemoryInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MemoryInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count the call and reserve its latency and failure.
    fn begin(&self, count: impl FnOnce(&mut StoreCalls)) -> (Duration, Option<String>) {
        let mut inner = self.write();
        count(&mut inner.calls);
        (inner.latency, inner.fail_next.take())
    }

    async fn settle(&self, count: impl FnOnce(&mut StoreCalls)) -> Result<(), StoreError> {
        let (latency, failure) = self.begin(count);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        match failure {
            Some(message) => Err(StoreError::Backend(message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn select(&self, query: &Select) -> Result<Rows, StoreError> {
        self.settle(|c| c.select += 1).await?;

        let inner = self.read();
        let empty = Vec::new();
        let table = inner.tables.get(&query.table).unwrap_or(&empty);

        // Filter first: the count covers the filtered set, before the range.
        let mut matched: Vec<&Row> = table
            .iter()
            .filter(|row| query.predicates.iter().all(|p| matches(row, p)))
            .collect();
        matched.sort_by(|a, b| {
            query.order.iter().fold(Ordering::Equal, |acc, order| {
                acc.then_with(|| {
                    let ord = compare_values(a.get(&order.column), b.get(&order.column));
                    if order.ascending { ord } else { ord.reverse() }
                })
            })
        });
        let total = matched.len();

        let rows: Vec<Row> = matched
            .into_iter()
            .skip(query.offset.unwrap_or(0))
            .take(query.limit.unwrap_or(usize::MAX))
            .map(|row| {
                let mut out = project(row, &query.columns);
                if let Some(embed) = &query.embed {
                    let related = related_rows(&inner.tables, embed, row.get("id"));
                    out.insert(embed.table.clone(), Value::Array(related));
                }
                out
            })
            .collect();

        let count = match query.count {
            Some(_) if !inner.hide_count => Some(total),
            _ => None,
        };
        trace!(table = %query.table, rows = rows.len(), total, "memory select");
        Ok(Rows { rows, count })
    }

    async fn insert(&self, table: &str, mut row: Row) -> Result<Row, StoreError> {
        self.settle(|c| c.insert += 1).await?;

        let now = Value::String(format_timestamp(OffsetDateTime::now_utc()));
        if !row.get("id").is_some_and(|v| !v.is_null()) {
            row.insert("id".into(), Value::String(uuid::Uuid::new_v4().to_string()));
        }
        row.entry("created_at").or_insert_with(|| now.clone());
        row.entry("updated_at").or_insert(now);

        self.write()
            .tables
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        Ok(row)
    }

    async fn update(&self, table: &str, id: &str, patch: Row) -> Result<Row, StoreError> {
        self.settle(|c| c.update += 1).await?;

        let mut inner = self.write();
        let row = inner
            .tables
            .get_mut(table)
            .and_then(|rows| rows.iter_mut().find(|row| has_id(row, id)))
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        for (column, value) in patch {
            row.insert(column, value);
        }
        row.insert(
            "updated_at".into(),
            Value::String(format_timestamp(OffsetDateTime::now_utc())),
        );
        Ok(row.clone())
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), StoreError> {
        self.settle(|c| c.delete += 1).await?;

        if let Some(rows) = self.write().tables.get_mut(table) {
            rows.retain(|row| !has_id(row, id));
        }
        Ok(())
    }
}

fn has_id(row: &Row, id: &str) -> bool {
    row.get("id").and_then(Value::as_str) == Some(id)
}

/// Text form of a column value as the remote store would compare it; `None` for null.
fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn matches(row: &Row, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::Eq { column, value } => text(row.get(column)).as_deref() == Some(value.as_str()),
        Predicate::ILike { column, needle } => text(row.get(column))
            .is_some_and(|v| v.to_lowercase().contains(&needle.to_lowercase())),
        Predicate::Gte { column, value } => {
            text(row.get(column)).is_some_and(|v| v.as_str() >= value.as_str())
        }
        Predicate::Lte { column, value } => {
            text(row.get(column)).is_some_and(|v| v.as_str() <= value.as_str())
        }
    }
}

/// Ascending order with nulls last.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(x), Some(y)) => text(Some(x)).cmp(&text(Some(y))),
    }
}

fn project(row: &Row, columns: &[String]) -> Row {
    if columns.is_empty() || columns.iter().any(|c| c == "*") {
        return row.clone();
    }
    columns
        .iter()
        .filter_map(|c| row.get(c).map(|v| (c.clone(), v.clone())))
        .collect()
}

fn related_rows(tables: &HashMap<String, Vec<Row>>, embed: &Embed, id: Option<&Value>) -> Vec<Value> {
    let (Some(rows), Some(id)) = (tables.get(&embed.table), id) else {
        return Vec::new();
    };
    rows.iter()
        .filter(|row| row.get(&embed.foreign_key) == Some(id))
        .map(|row| Value::Object(project(row, &embed.columns)))
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn task(id: &str, title: &str, status: &str, due: &str, category: Option<&str>) -> Value {
        json!({
            "id": id,
            "title": title,
            "status": status,
            "due_date": due,
            "category_id": category,
        })
    }

    fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store.seed(
            "tasks",
            [
                task("1", "Buy milk", "Done", "2024-01-05", Some("home")),
                task("2", "Write report", "To Do", "2024-01-20", Some("work")),
                task("3", "Call plumber", "Done", "2024-02-01", Some("home")),
                task("4", "Plan sprint", "In Progress", "2024-01-10", None),
            ],
        );
        store.seed(
            "categories",
            [
                json!({"id": "home", "title": "Home"}),
                json!({"id": "work", "title": "Work"}),
            ],
        );
        store
    }

    fn titles(rows: &Rows) -> Vec<&str> {
        rows.rows
            .iter()
            .map(|r| r["title"].as_str().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn select_filters_orders_and_counts() {
        let store = seeded();
        let rows = store
            .select(
                &Select::table("tasks")
                    .eq("status", "Done")
                    .order("title", true)
                    .exact_count(),
            )
            .await
            .unwrap();

        assert_eq!(titles(&rows), ["Buy milk", "Call plumber"]);
        assert_eq!(rows.count, Some(2));
    }

    #[tokio::test]
    async fn ilike_is_case_insensitive_substring() {
        let store = seeded();
        let rows = store
            .select(&Select::table("tasks").ilike("title", "PLAN"))
            .await
            .unwrap();
        assert_eq!(titles(&rows), ["Plan sprint"]);
    }

    #[tokio::test]
    async fn date_bounds_are_inclusive() {
        let store = seeded();
        let rows = store
            .select(
                &Select::table("tasks")
                    .gte("due_date", "2024-01-05")
                    .lte("due_date", "2024-01-20")
                    .order("due_date", false),
            )
            .await
            .unwrap();
        assert_eq!(titles(&rows), ["Write report", "Plan sprint", "Buy milk"]);
    }

    #[tokio::test]
    async fn range_limits_rows_but_not_count() {
        let store = seeded();
        let rows = store
            .select(
                &Select::table("tasks")
                    .order("title", true)
                    .range(2, 3)
                    .exact_count(),
            )
            .await
            .unwrap();
        assert_eq!(titles(&rows), ["Plan sprint", "Write report"]);
        assert_eq!(rows.count, Some(4));

        let beyond = store
            .select(&Select::table("tasks").range(10, 19).exact_count())
            .await
            .unwrap();
        assert!(beyond.rows.is_empty());
        assert_eq!(beyond.count, Some(4));
    }

    #[tokio::test]
    async fn nulls_sort_last_ascending() {
        let store = seeded();
        let rows = store
            .select(&Select::table("tasks").order("category_id", true).order("title", true))
            .await
            .unwrap();
        assert_eq!(titles(&rows).last(), Some(&"Plan sprint"));
    }

    #[tokio::test]
    async fn embed_attaches_related_rows() {
        let store = seeded();
        let rows = store
            .select(
                &Select::table("categories")
                    .order("title", true)
                    .embed(Embed {
                        table: "tasks".to_string(),
                        foreign_key: "category_id".to_string(),
                        columns: vec!["id".to_string(), "title".to_string()],
                    }),
            )
            .await
            .unwrap();

        let home = &rows.rows[0];
        let related = home["tasks"].as_array().unwrap();
        assert_eq!(related.len(), 2);
        assert!(related.iter().all(|t| t.get("status").is_none()));
        assert_eq!(rows.rows[1]["tasks"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn insert_assigns_id_and_timestamps() {
        let store = MemoryStore::new();
        let mut row = Row::new();
        row.insert("title".into(), json!("Fresh"));

        let created = store.insert("tasks", row).await.unwrap();
        assert!(created["id"].as_str().is_some_and(|id| !id.is_empty()));
        assert!(created.contains_key("created_at"));
        assert_eq!(store.rows("tasks").len(), 1);
        assert_eq!(store.calls().insert, 1);
    }

    #[tokio::test]
    async fn update_merges_only_given_columns() {
        let store = seeded();
        let mut patch = Row::new();
        patch.insert("status".into(), json!("Done"));

        let updated = store.update("tasks", "2", patch).await.unwrap();
        assert_eq!(updated["status"], "Done");
        assert_eq!(updated["title"], "Write report");

        let err = store.update("tasks", "nope", Row::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_removes_row() {
        let store = seeded();
        store.delete("tasks", "1").await.unwrap();
        assert_eq!(store.rows("tasks").len(), 3);
        // Missing rows are not an error.
        store.delete("tasks", "1").await.unwrap();
    }

    #[tokio::test]
    async fn injected_failure_hits_one_call() {
        let store = seeded();
        store.fail_next("connection reset");

        let err = store.select(&Select::table("tasks")).await.unwrap_err();
        assert_eq!(err.to_string(), "connection reset");
        assert!(store.select(&Select::table("tasks")).await.is_ok());
        assert_eq!(store.calls().select, 2);
    }

    #[tokio::test]
    async fn hidden_count_is_unknown() {
        let store = seeded();
        store.hide_count(true);
        let rows = store
            .select(&Select::table("tasks").exact_count())
            .await
            .unwrap();
        assert_eq!(rows.count, None);
    }

    #[tokio::test(start_paused = true)]
    async fn latency_delays_response() {
        let store = seeded();
        store.set_latency(Duration::from_millis(250));

        let started = tokio::time::Instant::now();
        store.select(&Select::table("tasks")).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(250));
    }
}
