use std::{future::Future, sync::Arc, time::Instant};

use taskboard_store::Store;
use tracing::{debug, instrument, warn};

use crate::error::PipelineError;
use crate::event::{EventKind, MutationKind, Observers, PipelineEvent};
use crate::executor::OperationStatus;
use crate::resource::Resource;

/// Create, update and delete for one entity type.
///
/// Writes share the loading flag and error with queries. They do not touch
/// the entity cache or re-run the current query; callers refresh explicitly.
pub struct MutationGateway<R: Resource> {
    store: Arc<dyn Store>,
    status: OperationStatus,
    observers: Observers,
    _resource: std::marker::PhantomData<fn() -> R>,
}

impl<R: Resource> MutationGateway<R> {
    pub fn new(store: Arc<dyn Store>, status: OperationStatus) -> Self {
        Self::with_observers(store, status, Observers::default())
    }

    pub(crate) fn with_observers(
        store: Arc<dyn Store>,
        status: OperationStatus,
        observers: Observers,
    ) -> Self {
        Self {
            store,
            status,
            observers,
            _resource: std::marker::PhantomData,
        }
    }

    /// Insert a new entity and return it as stored.
    #[instrument(level = "debug", skip_all, fields(entity = R::TABLE))]
    pub async fn create(&self, payload: &R::Create) -> Result<R::Entity, PipelineError> {
        let row = R::encode_create(payload);
        self.write(MutationKind::Create, async {
            let stored = self.store.insert(R::TABLE, row).await?;
            R::decode(stored)
        })
        .await
    }

    /// Apply a partial update; only fields present in `patch` are sent.
    #[instrument(level = "debug", skip_all, fields(entity = R::TABLE, id = id.as_ref()))]
    pub async fn update(&self, id: &R::Id, patch: &R::Update) -> Result<R::Entity, PipelineError> {
        let row = R::encode_update(patch);
        self.write(MutationKind::Update, async {
            let stored = self.store.update(R::TABLE, id.as_ref(), row).await?;
            R::decode(stored)
        })
        .await
    }

    #[instrument(level = "debug", skip_all, fields(entity = R::TABLE, id = id.as_ref()))]
    pub async fn delete(&self, id: &R::Id) -> Result<(), PipelineError> {
        self.write(MutationKind::Delete, async {
            self.store.delete(R::TABLE, id.as_ref()).await?;
            Ok(())
        })
        .await
    }

    async fn write<T>(
        &self,
        kind: MutationKind,
        op: impl Future<Output = Result<T, PipelineError>>,
    ) -> Result<T, PipelineError> {
        let _guard = self.status.begin();
        self.observers.emit(|| {
            PipelineEvent::new(EventKind::MutationStarted, R::TABLE).with_mutation(kind)
        });
        let started = Instant::now();

        let result = op.await;
        let elapsed = started.elapsed();

        match &result {
            Ok(_) => {
                debug!(op = kind.as_str(), ?elapsed, "mutation completed");
                self.observers.emit(|| {
                    PipelineEvent::new(EventKind::MutationCompleted, R::TABLE)
                        .with_mutation(kind)
                        .with_elapsed(elapsed)
                });
            }
            Err(e) => {
                warn!(op = kind.as_str(), error = %e, "mutation failed");
                self.status.fail(e.to_string());
                self.observers.emit(|| {
                    PipelineEvent::new(EventKind::MutationFailed, R::TABLE)
                        .with_mutation(kind)
                        .with_elapsed(elapsed)
                        .with_reason(e.to_string())
                });
            }
        }
        result
    }
}
