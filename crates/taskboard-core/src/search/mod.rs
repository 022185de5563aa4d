use std::{sync::Arc, time::Duration};

use tokio::{sync::mpsc, time::timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::event::{EventKind, Observers, PipelineEvent};
use crate::resource::Resource;
use crate::view::ViewStateStore;

/// Turns a stream of raw search text into settled filter updates.
///
/// A value settles once no newer text arrives within the quiet window.
/// Settling the same text twice in a row is a no-op, and settling merges
/// into the latest filter rather than the one seen when typing started.
pub struct SearchDebouncer<R: Resource> {
    view: Arc<ViewStateStore<R>>,
    window: Duration,
    observers: Observers,
    last: Option<String>,
}

impl<R: Resource> SearchDebouncer<R> {
    pub fn new(view: Arc<ViewStateStore<R>>, window: Duration) -> Self {
        Self {
            view,
            window,
            observers: Observers::default(),
            last: None,
        }
    }

    pub(crate) fn with_observers(mut self, observers: Observers) -> Self {
        self.observers = observers;
        self
    }

    /// Consume raw text until the queue closes or `token` is cancelled.
    pub async fn run(mut self, mut input: mpsc::UnboundedReceiver<String>, token: CancellationToken) {
        loop {
            let first = tokio::select! {
                _ = token.cancelled() => return,
                text = input.recv() => text,
            };
            let Some(mut pending) = first else {
                return;
            };

            // Restart the window on every keystroke.
            let closed = loop {
                let next = tokio::select! {
                    _ = token.cancelled() => return,
                    next = timeout(self.window, input.recv()) => next,
                };
                match next {
                    Ok(Some(text)) => {
                        trace!(entity = R::TABLE, "search window restarted");
                        pending = text;
                    }
                    Ok(None) => break true,
                    Err(_) => break false,
                }
            };

            self.settle(pending);
            if closed {
                return;
            }
        }
    }

    fn settle(&mut self, text: String) {
        if self.last.as_deref() == Some(text.as_str()) {
            trace!(entity = R::TABLE, "search text unchanged");
            return;
        }
        debug!(entity = R::TABLE, search = %text, "search settled");

        self.view.merge_filter(|filter| R::merge_search(filter, &text));
        self.observers
            .emit(|| PipelineEvent::new(EventKind::SearchSettled, R::TABLE).with_reason(text.clone()));
        self.last = Some(text);
    }
}
