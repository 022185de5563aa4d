use std::sync::{Arc, Mutex, PoisonError};

use taskboard_model::{Sort, SortField};
use taskboard_store::Store;
use tokio::sync::OnceCell;
use tracing::{debug, instrument};

use crate::error::PipelineError;
use crate::event::{EventKind, Observers, PipelineEvent};
use crate::resource::Resource;

type Cell<E> = Arc<OnceCell<Arc<Vec<E>>>>;

/// Whole-collection cache, loaded once on first use.
///
/// Concurrent callers share a single load. A failed load is not cached, so the
/// next caller tries again. The cache is never refreshed by itself: writes
/// through a [`MutationGateway`](crate::MutationGateway) leave it stale until
/// [`invalidate`](Self::invalidate) is called.
pub struct EntityCache<R: Resource> {
    store: Arc<dyn Store>,
    observers: Observers,
    cell: Mutex<Cell<R::Entity>>,
}

impl<R: Resource> EntityCache<R> {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self::with_observers(store, Observers::default())
    }

    pub(crate) fn with_observers(store: Arc<dyn Store>, observers: Observers) -> Self {
        Self {
            store,
            observers,
            cell: Mutex::new(Arc::new(OnceCell::new())),
        }
    }

    /// Every entity, ordered by the default sort field.
    #[instrument(level = "debug", skip(self), fields(entity = R::TABLE))]
    pub async fn get_all(&self) -> Result<Arc<Vec<R::Entity>>, PipelineError> {
        let cell = self.current();
        if let Some(all) = cell.get() {
            self.observers.emit(|| {
                PipelineEvent::new(EventKind::CacheHit, R::TABLE).with_rows(all.len())
            });
            return Ok(Arc::clone(all));
        }

        let all = cell.get_or_try_init(|| self.load()).await?;
        Ok(Arc::clone(all))
    }

    /// Look up one entity by id in the cached collection.
    pub async fn find(&self, id: &R::Id) -> Result<Option<R::Entity>, PipelineError> {
        let all = self.get_all().await?;
        Ok(all
            .iter()
            .find(|e| R::entity_id(e).as_ref() == id.as_ref())
            .cloned())
    }

    /// The cached collection re-sorted locally.
    pub async fn sorted(&self, sort: Sort<R::SortField>) -> Result<Vec<R::Entity>, PipelineError> {
        let mut all = self.get_all().await?.as_ref().clone();
        sort.apply(&mut all);
        Ok(all)
    }

    /// Drop the cached collection; the next read loads it again.
    pub fn invalidate(&self) {
        let mut cell = self.cell.lock().unwrap_or_else(PoisonError::into_inner);
        *cell = Arc::new(OnceCell::new());
        debug!(entity = R::TABLE, "cache invalidated");
    }

    pub fn is_loaded(&self) -> bool {
        self.current().initialized()
    }

    fn current(&self) -> Cell<R::Entity> {
        Arc::clone(&self.cell.lock().unwrap_or_else(PoisonError::into_inner))
    }

    async fn load(&self) -> Result<Arc<Vec<R::Entity>>, PipelineError> {
        let sort = Sort::<R::SortField>::default();
        let select = R::select().order(sort.field.column(), sort.is_ascending());
        let rows = self.store.select(&select).await?;
        let all = R::decode_all(rows.rows)?;

        debug!(entity = R::TABLE, rows = all.len(), "cache loaded");
        self.observers
            .emit(|| PipelineEvent::new(EventKind::CacheLoaded, R::TABLE).with_rows(all.len()));
        Ok(Arc::new(all))
    }
}
