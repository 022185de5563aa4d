use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use tokio::sync::watch;

/// Loading flag and last error shared by queries and mutations of one entity type.
///
/// Loading is derived from the number of operations in flight, so an older
/// operation finishing never clears the flag while a newer one still runs.
#[derive(Clone)]
pub struct OperationStatus {
    inner: Arc<StatusInner>,
}

struct StatusInner {
    loading: watch::Sender<bool>,
    error: watch::Sender<Option<String>>,
    in_flight: AtomicUsize,
}

/// Marks one operation as running until dropped.
#[must_use = "the operation counts as in flight only while the guard lives"]
pub struct InFlight {
    inner: Arc<StatusInner>,
}

impl OperationStatus {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StatusInner {
                loading: watch::Sender::new(false),
                error: watch::Sender::new(None),
                in_flight: AtomicUsize::new(0),
            }),
        }
    }

    /// Start an operation: clears the error and raises the loading flag.
    pub fn begin(&self) -> InFlight {
        self.inner.in_flight.fetch_add(1, Ordering::SeqCst);
        self.inner.error.send_if_modified(|error| error.take().is_some());
        self.inner.sync_loading();
        InFlight {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Publish an error; it stays until the next operation starts.
    pub fn fail(&self, message: impl Into<String>) {
        self.inner.error.send_replace(Some(message.into()));
    }

    pub fn loading(&self) -> watch::Receiver<bool> {
        self.inner.loading.subscribe()
    }

    pub fn error(&self) -> watch::Receiver<Option<String>> {
        self.inner.error.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        *self.inner.loading.borrow()
    }

    pub fn last_error(&self) -> Option<String> {
        self.inner.error.borrow().clone()
    }
}

impl Default for OperationStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusInner {
    fn sync_loading(&self) {
        self.loading.send_if_modified(|loading| {
            let now = self.in_flight.load(Ordering::SeqCst) > 0;
            let changed = *loading != now;
            *loading = now;
            changed
        });
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.inner.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.inner.sync_loading();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loading_tracks_operations_in_flight() {
        let status = OperationStatus::new();
        assert!(!status.is_loading());

        let first = status.begin();
        let second = status.begin();
        assert!(status.is_loading());

        drop(first);
        assert!(status.is_loading());
        drop(second);
        assert!(!status.is_loading());
    }

    #[test]
    fn error_survives_until_next_begin() {
        let status = OperationStatus::new();
        let guard = status.begin();
        status.fail("boom");
        drop(guard);
        assert_eq!(status.last_error().as_deref(), Some("boom"));

        let _guard = status.begin();
        assert_eq!(status.last_error(), None);
    }

    #[test]
    fn receivers_see_transitions() {
        let status = OperationStatus::new();
        let mut loading = status.loading();

        let guard = status.begin();
        assert!(loading.has_changed().unwrap());
        assert!(*loading.borrow_and_update());

        drop(guard);
        assert!(!*loading.borrow_and_update());
    }
}
