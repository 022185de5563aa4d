use taskboard_core::{EventKind, PipelineEvent};
use tracing::{debug, info, trace, warn};

trait View {
    fn entity(&self) -> &'static str;
    fn seq(&self) -> u64;
    fn op(&self) -> &'static str;
    fn elapsed_ms(&self) -> u64;
    fn rows(&self) -> usize;
    fn reason(&self) -> &str;
}

impl View for PipelineEvent {
    #[inline]
    fn entity(&self) -> &'static str {
        self.entity
    }
    #[inline]
    fn seq(&self) -> u64 {
        self.seq.unwrap_or(0)
    }
    #[inline]
    fn op(&self) -> &'static str {
        self.mutation.map_or("unknown", |m| m.as_str())
    }
    #[inline]
    fn elapsed_ms(&self) -> u64 {
        self.elapsed.map_or(0, |d| d.as_millis() as u64)
    }
    #[inline]
    fn rows(&self) -> usize {
        self.rows.unwrap_or(0)
    }
    #[inline]
    fn reason(&self) -> &str {
        self.reason.as_deref().unwrap_or("unknown")
    }
}

#[inline]
pub fn message_for(kind: EventKind) -> &'static str {
    match kind {
        // input
        EventKind::SearchSettled => "search text settled",
        EventKind::QueryComposed => "query descriptor composed",

        // queries
        EventKind::QueryStarted => "query sent to store",
        EventKind::QueryCompleted => "query result published",
        EventKind::QueryFailed => "query failed",
        EventKind::QueryDiscarded => "query outcome discarded (superseded)",

        // writes
        EventKind::MutationStarted => "mutation sent to store",
        EventKind::MutationCompleted => "mutation applied",
        EventKind::MutationFailed => "mutation failed",

        // cache
        EventKind::CacheLoaded => "entity cache loaded",
        EventKind::CacheHit => "entity cache hit",
    }
}

#[inline]
pub(crate) fn log_event(e: &PipelineEvent) {
    let msg = message_for(e.kind);

    match e.kind {
        EventKind::SearchSettled => debug!(entity = e.entity(), search = e.reason(), "{msg}"),
        EventKind::QueryComposed => trace!(entity = e.entity(), "{msg}"),

        EventKind::QueryStarted => trace!(entity = e.entity(), seq = e.seq(), "{msg}"),
        EventKind::QueryCompleted => debug!(
            entity = e.entity(),
            seq = e.seq(),
            rows = e.rows(),
            elapsed_ms = e.elapsed_ms(),
            "{msg}"
        ),
        EventKind::QueryFailed => warn!(
            entity = e.entity(),
            seq = e.seq(),
            reason = e.reason(),
            elapsed_ms = e.elapsed_ms(),
            "{msg}"
        ),
        EventKind::QueryDiscarded => trace!(entity = e.entity(), seq = e.seq(), "{msg}"),

        EventKind::MutationStarted => trace!(entity = e.entity(), op = e.op(), "{msg}"),
        EventKind::MutationCompleted => info!(
            entity = e.entity(),
            op = e.op(),
            elapsed_ms = e.elapsed_ms(),
            "{msg}"
        ),
        EventKind::MutationFailed => {
            warn!(entity = e.entity(), op = e.op(), reason = e.reason(), "{msg}")
        }

        EventKind::CacheLoaded => debug!(entity = e.entity(), rows = e.rows(), "{msg}"),
        EventKind::CacheHit => trace!(entity = e.entity(), rows = e.rows(), "{msg}"),
    }
}
