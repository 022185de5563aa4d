mod view;

use taskboard_core::{PipelineEvent, PipelineObserver};

pub use view::message_for;

/// Reports every pipeline event as a `tracing` record.
///
/// Levels follow the event: failures are warnings, query and cache traffic
/// is debug, dedup and discard noise is trace.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventLogger;

impl EventLogger {
    pub fn new() -> Self {
        Self
    }
}

impl PipelineObserver for EventLogger {
    fn on_event(&self, event: &PipelineEvent) {
        view::log_event(event);
    }
}
