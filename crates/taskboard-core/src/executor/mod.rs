mod status;
pub use status::{InFlight, OperationStatus};

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Instant,
};

use taskboard_model::{QueryDescriptor, QueryResult};
use taskboard_store::Store;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, trace, warn};

use crate::error::PipelineError;
use crate::event::{EventKind, Observers, PipelineEvent};
use crate::resource::{Descriptor, Resource};

/// Outcome of one query execution.
pub type QueryOutcome<E> = Result<Arc<QueryResult<E>>, PipelineError>;

/// Published outcome together with the descriptor that produced it.
#[derive(Debug, Clone)]
pub struct QuerySnapshot<F, S, E> {
    /// Submission order; later snapshots always carry a larger number.
    pub seq: u64,
    pub descriptor: QueryDescriptor<F, S>,
    pub outcome: QueryOutcome<E>,
}

pub type Snapshot<R> = QuerySnapshot<
    <R as Resource>::Filter,
    <R as Resource>::SortField,
    <R as Resource>::Entity,
>;

/// Runs descriptors against the store with switch-latest semantics.
///
/// Every submission gets a sequence number. Only the outcome of the most
/// recently submitted query is published; older ones still run to completion
/// but are discarded.
pub struct QueryExecutor<R: Resource> {
    inner: Arc<ExecutorInner<R>>,
}

struct ExecutorInner<R: Resource> {
    store: Arc<dyn Store>,
    status: OperationStatus,
    observers: Observers,
    /// Sequence number of the most recent submission.
    latest: Mutex<u64>,
    results: watch::Sender<Option<Snapshot<R>>>,
    cancel: CancellationToken,
}

impl<R: Resource> Clone for QueryExecutor<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: Resource> QueryExecutor<R> {
    pub fn new(store: Arc<dyn Store>, status: OperationStatus) -> Self {
        Self::with_observers(store, status, Observers::default())
    }

    pub(crate) fn with_observers(
        store: Arc<dyn Store>,
        status: OperationStatus,
        observers: Observers,
    ) -> Self {
        Self {
            inner: Arc::new(ExecutorInner {
                store,
                status,
                observers,
                latest: Mutex::new(0),
                results: watch::Sender::new(None),
                cancel: CancellationToken::new(),
            }),
        }
    }

    /// Start executing `descriptor`, superseding every earlier submission.
    ///
    /// Loading is raised before this returns.
    pub fn submit(&self, descriptor: Descriptor<R>) -> JoinHandle<()> {
        let (seq, guard) = {
            let mut latest = self.inner.latest.lock().unwrap_or_else(PoisonError::into_inner);
            *latest += 1;
            (*latest, self.inner.status.begin())
        };
        trace!(entity = R::TABLE, seq, "query submitted");

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.execute(seq, descriptor, guard).await })
    }

    /// Submit every descriptor from `input` until it closes or `token` is cancelled.
    pub async fn run(self, mut input: mpsc::UnboundedReceiver<Descriptor<R>>, token: CancellationToken) {
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                next = input.recv() => match next {
                    Some(descriptor) => {
                        self.submit(descriptor);
                    }
                    None => break,
                },
            }
        }
        debug!(entity = R::TABLE, "query executor stopped");
    }

    /// Abandon queries still waiting on the store. Nothing is published for them.
    pub fn cancel(&self) {
        self.inner.cancel.cancel();
    }

    pub fn results(&self) -> watch::Receiver<Option<Snapshot<R>>> {
        self.inner.results.subscribe()
    }

    /// Most recently published snapshot.
    pub fn latest(&self) -> Option<Snapshot<R>> {
        self.inner.results.borrow().clone()
    }

    pub fn status(&self) -> &OperationStatus {
        &self.inner.status
    }
}

impl<R: Resource> ExecutorInner<R> {
    #[instrument(level = "debug", skip_all, fields(entity = R::TABLE, seq = seq))]
    async fn execute(&self, seq: u64, descriptor: Descriptor<R>, guard: InFlight) {
        self.observers
            .emit(|| PipelineEvent::new(EventKind::QueryStarted, R::TABLE).with_seq(seq));
        let started = Instant::now();

        let outcome = tokio::select! {
            _ = self.cancel.cancelled() => {
                debug!("query abandoned");
                return;
            }
            outcome = self.fetch(&descriptor) => outcome,
        };
        let elapsed = started.elapsed();

        let kind = match &outcome {
            Ok(result) => {
                debug!(rows = result.rows.len(), total = result.total, ?elapsed, "query completed");
                self.observers.emit(|| {
                    PipelineEvent::new(EventKind::QueryCompleted, R::TABLE)
                        .with_seq(seq)
                        .with_elapsed(elapsed)
                        .with_rows(result.rows.len())
                });
                EventKind::QueryCompleted
            }
            Err(e) => {
                warn!(error = %e, ?elapsed, "query failed");
                self.observers.emit(|| {
                    PipelineEvent::new(EventKind::QueryFailed, R::TABLE)
                        .with_seq(seq)
                        .with_elapsed(elapsed)
                        .with_reason(e.to_string())
                });
                EventKind::QueryFailed
            }
        };

        if !self.publish(seq, descriptor, outcome) {
            debug!(?kind, "outcome superseded by a newer query");
            self.observers.emit(|| {
                PipelineEvent::new(EventKind::QueryDiscarded, R::TABLE)
                    .with_seq(seq)
                    .with_elapsed(elapsed)
            });
        }

        // Loading drops only after the outcome is visible.
        drop(guard);
    }

    async fn fetch(&self, descriptor: &Descriptor<R>) -> QueryOutcome<R::Entity> {
        let select = R::build_select(descriptor);
        let rows = self.store.select(&select).await?;
        let total = rows.count.ok_or(PipelineError::CountUnavailable)?;
        let entities = R::decode_all(rows.rows)?;
        Ok(Arc::new(QueryResult::new(entities, total, descriptor.page)))
    }

    /// Publish if `seq` is still the latest submission.
    fn publish(&self, seq: u64, descriptor: Descriptor<R>, outcome: QueryOutcome<R::Entity>) -> bool {
        let latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        if *latest != seq {
            return false;
        }

        if let Err(e) = &outcome {
            self.status.fail(e.to_string());
        }
        self.results.send_replace(Some(QuerySnapshot {
            seq,
            descriptor,
            outcome,
        }));
        true
    }
}
