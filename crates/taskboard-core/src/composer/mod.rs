use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::event::{EventKind, Observers, PipelineEvent};
use crate::resource::{Descriptor, Resource};
use crate::view::{State, ViewStateStore};

/// Combines the view inputs into query descriptors.
///
/// Changes landing in the same scheduler turn collapse into one descriptor.
/// Equal consecutive descriptors are emitted once, unless a setter call or a
/// refresh bumped the view trigger in between.
pub struct QueryComposer<R: Resource> {
    state: watch::Receiver<State<R>>,
    observers: Observers,
    last: Option<State<R>>,
}

impl<R: Resource> QueryComposer<R> {
    pub fn new(view: &ViewStateStore<R>) -> Self {
        Self {
            state: view.subscribe(),
            observers: Observers::default(),
            last: None,
        }
    }

    pub(crate) fn with_observers(mut self, observers: Observers) -> Self {
        self.observers = observers;
        self
    }

    /// Emit the initial descriptor, then one per settled change, until
    /// `token` is cancelled or the receiving side goes away.
    pub async fn run(mut self, out: mpsc::UnboundedSender<Descriptor<R>>, token: CancellationToken) {
        if !self.publish(&out) {
            return;
        }

        loop {
            let changed = tokio::select! {
                _ = token.cancelled() => return,
                changed = self.state.changed() => changed,
            };
            if changed.is_err() {
                debug!(entity = R::TABLE, "view state dropped; composer stopping");
                return;
            }

            // Let the rest of a burst of updates land before reading.
            tokio::task::yield_now().await;

            if !self.publish(&out) {
                return;
            }
        }
    }

    /// Returns `false` once nobody consumes descriptors.
    fn publish(&mut self, out: &mpsc::UnboundedSender<Descriptor<R>>) -> bool {
        let state = self.state.borrow_and_update().clone();
        let forced = match &self.last {
            None => true,
            Some(last) if last.trigger != state.trigger => true,
            Some(last) if last.descriptor == state.descriptor => {
                trace!(entity = R::TABLE, "descriptor unchanged");
                return true;
            }
            Some(_) => false,
        };
        trace!(entity = R::TABLE, forced, descriptor = ?state.descriptor, "descriptor composed");

        self.observers
            .emit(|| PipelineEvent::new(EventKind::QueryComposed, R::TABLE));
        let descriptor = state.descriptor.clone();
        self.last = Some(state);
        out.send(descriptor).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::resource::Tasks;
    use taskboard_model::{PageSpec, Sort, TaskFilter, TaskSortField, TaskStatus};

    fn spawn() -> (
        ViewStateStore<Tasks>,
        mpsc::UnboundedReceiver<Descriptor<Tasks>>,
        CancellationToken,
    ) {
        let (view, _search) = ViewStateStore::<Tasks>::new(PageSpec::default());
        let (tx, rx) = mpsc::unbounded_channel();
        let token = CancellationToken::new();
        tokio::spawn(QueryComposer::new(&view).run(tx, token.clone()));
        (view, rx, token)
    }

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn emits_initial_descriptor() {
        let (_view, mut rx, _token) = spawn();
        let first = rx.recv().await.unwrap();
        assert!(first.filter.is_empty());
        assert_eq!(first.page, PageSpec::new(1, 10));
    }

    #[tokio::test]
    async fn same_turn_updates_collapse() {
        let (view, mut rx, _token) = spawn();
        rx.recv().await.unwrap();

        view.set_filter(TaskFilter::new().with_status(TaskStatus::Done));
        view.set_sort(Sort::desc(TaskSortField::DueDate));
        view.set_pagination(PageSpec::new(2, 10));
        settle().await;

        let next = rx.recv().await.unwrap();
        assert_eq!(next.filter.status, Some(TaskStatus::Done));
        assert_eq!(next.sort, Sort::desc(TaskSortField::DueDate));
        assert_eq!(next.page.page(), 2);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn merge_that_ends_where_it_started_is_not_reemitted() {
        let (view, mut rx, _token) = spawn();
        rx.recv().await.unwrap();

        view.merge_filter(|f| f.clone().with_title("rep"));
        view.merge_filter(|_| TaskFilter::default());
        settle().await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn reapplied_pagination_reemits() {
        let (view, mut rx, _token) = spawn();
        let first = rx.recv().await.unwrap();

        view.set_pagination(view.pagination());
        let again = rx.recv().await.unwrap();
        assert_eq!(again, first);
    }

    #[tokio::test]
    async fn refresh_forces_reemission() {
        let (view, mut rx, _token) = spawn();
        let first = rx.recv().await.unwrap();

        view.refresh();
        let again = rx.recv().await.unwrap();
        assert_eq!(again, first);
    }

    #[tokio::test]
    async fn stops_on_cancel() {
        let (_view, mut rx, token) = spawn();
        rx.recv().await.unwrap();

        token.cancel();
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn batched_updates_never_split_on_worker_threads() {
        let (view, mut rx, _token) = spawn();
        rx.recv().await.unwrap();

        for i in 0..200u32 {
            let status = if i % 2 == 0 { TaskStatus::Done } else { TaskStatus::ToDo };
            let sort = if i % 2 == 0 {
                Sort::desc(TaskSortField::DueDate)
            } else {
                Sort::asc(TaskSortField::Priority)
            };
            view.update(|d| {
                d.filter = TaskFilter::new().with_status(status);
                d.sort = sort;
                d.page = PageSpec::new(i + 2, 10);
            });

            let next = tokio::time::timeout(Duration::from_secs(5), rx.recv())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(next.filter.status, Some(status));
            assert_eq!(next.sort, sort);
            assert_eq!(next.page.page(), i + 2);
        }

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(rx.try_recv().is_err());
    }
}
