use std::{sync::Arc, time::Duration};

/// What happened inside a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Search text settled and was merged into the filter.
    SearchSettled,
    /// A new query descriptor was produced.
    QueryComposed,
    /// A query was sent to the store.
    QueryStarted,
    /// A query result was published.
    QueryCompleted,
    /// A query failure was published.
    QueryFailed,
    /// A query finished after a newer one was submitted; its outcome was dropped.
    QueryDiscarded,
    MutationStarted,
    MutationCompleted,
    MutationFailed,
    /// The full collection was loaded into the entity cache.
    CacheLoaded,
    /// The entity cache answered without touching the store.
    CacheHit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

impl MutationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationKind::Create => "create",
            MutationKind::Update => "update",
            MutationKind::Delete => "delete",
        }
    }
}

/// Event emitted to [`PipelineObserver`]s.
#[derive(Debug, Clone)]
pub struct PipelineEvent {
    pub kind: EventKind,
    /// Table the pipeline serves (`tasks`, `categories`).
    pub entity: &'static str,
    /// Sequence number of the query, for query events.
    pub seq: Option<u64>,
    pub mutation: Option<MutationKind>,
    pub elapsed: Option<Duration>,
    /// Number of rows published or loaded.
    pub rows: Option<usize>,
    /// Error message or settled search text.
    pub reason: Option<String>,
}

impl PipelineEvent {
    pub fn new(kind: EventKind, entity: &'static str) -> Self {
        Self {
            kind,
            entity,
            seq: None,
            mutation: None,
            elapsed: None,
            rows: None,
            reason: None,
        }
    }

    pub fn with_seq(mut self, seq: u64) -> Self {
        self.seq = Some(seq);
        self
    }

    pub fn with_mutation(mut self, mutation: MutationKind) -> Self {
        self.mutation = Some(mutation);
        self
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = Some(elapsed);
        self
    }

    pub fn with_rows(mut self, rows: usize) -> Self {
        self.rows = Some(rows);
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Receives pipeline events synchronously, on the task that produced them.
///
/// Implementations must be cheap; they run inline with query publication.
pub trait PipelineObserver: Send + Sync {
    fn on_event(&self, event: &PipelineEvent);
}

/// Fan-out to the observers registered on a service.
#[derive(Clone, Default)]
pub(crate) struct Observers {
    list: Arc<[Arc<dyn PipelineObserver>]>,
}

impl Observers {
    pub(crate) fn new(list: Vec<Arc<dyn PipelineObserver>>) -> Self {
        Self { list: list.into() }
    }

    /// Build the event only when someone listens.
    pub(crate) fn emit(&self, make: impl FnOnce() -> PipelineEvent) {
        if self.list.is_empty() {
            return;
        }
        let event = make();
        for observer in self.list.iter() {
            observer.on_event(&event);
        }
    }
}
