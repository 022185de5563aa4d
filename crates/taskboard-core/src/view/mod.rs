use taskboard_model::{PageSpec, QueryDescriptor, Sort};
use tokio::sync::{mpsc, watch};

use crate::resource::{Descriptor, Resource};

/// Filter, sort and pagination as one value, plus a trigger counter.
///
/// `trigger` is bumped by every setter call and by refresh, even when the
/// value does not change. Internal filter merges leave it alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState<F, S> {
    pub descriptor: QueryDescriptor<F, S>,
    pub trigger: u64,
}

/// [`ViewState`] for one resource.
pub type State<R> = ViewState<<R as Resource>::Filter, <R as Resource>::SortField>;

/// Current filter, sort and pagination for one entity type.
///
/// All three live in a single `watch` cell, so a reader never sees a
/// half-applied [`update`](Self::update). Raw search text goes to a separate
/// queue consumed by the [`SearchDebouncer`](crate::SearchDebouncer).
pub struct ViewStateStore<R: Resource> {
    state: watch::Sender<State<R>>,
    search: mpsc::UnboundedSender<String>,
}

impl<R: Resource> ViewStateStore<R> {
    /// Create the store and the receiving end of the raw search queue.
    pub fn new(page: PageSpec) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (search, search_rx) = mpsc::unbounded_channel();
        let state = State::<R> {
            descriptor: Descriptor::<R> {
                filter: R::Filter::default(),
                sort: Sort::default(),
                page,
            },
            trigger: 0,
        };
        let store = Self {
            state: watch::Sender::new(state),
            search,
        };
        (store, search_rx)
    }

    pub fn set_filter(&self, filter: R::Filter) {
        self.update(|d| d.filter = filter);
    }

    pub fn set_sort(&self, sort: Sort<R::SortField>) {
        self.update(|d| d.sort = sort);
    }

    /// Re-applying the current page re-runs the query.
    pub fn set_pagination(&self, page: PageSpec) {
        self.update(|d| d.page = page);
    }

    /// Change several inputs with a single notification.
    pub fn update(&self, edit: impl FnOnce(&mut Descriptor<R>)) {
        self.state.send_modify(|state| {
            edit(&mut state.descriptor);
            state.trigger = state.trigger.wrapping_add(1);
        });
    }

    /// Queue raw search text. Dropped silently once the debouncer is gone.
    pub fn set_search(&self, text: impl Into<String>) {
        let _ = self.search.send(text.into());
    }

    /// Force the current descriptor to run again.
    pub fn refresh(&self) {
        self.update(|_| {});
    }

    /// Update the filter in place; subscribers are notified only on change.
    pub fn merge_filter(&self, merge: impl FnOnce(&R::Filter) -> R::Filter) {
        self.state.send_if_modified(|state| {
            let next = merge(&state.descriptor.filter);
            if next == state.descriptor.filter {
                return false;
            }
            state.descriptor.filter = next;
            true
        });
    }

    pub fn filter(&self) -> R::Filter {
        self.state.borrow().descriptor.filter.clone()
    }

    pub fn sort(&self) -> Sort<R::SortField> {
        self.state.borrow().descriptor.sort
    }

    pub fn pagination(&self) -> PageSpec {
        self.state.borrow().descriptor.page
    }

    /// Descriptor built from the current inputs.
    pub fn descriptor(&self) -> Descriptor<R> {
        self.state.borrow().descriptor.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<State<R>> {
        self.state.subscribe()
    }
}
