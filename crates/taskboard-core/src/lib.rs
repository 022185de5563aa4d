//! Reactive query pipeline for the task board.
//!
//! Each entity type runs the same pipeline, wired up by [`Service`]:
//!
//! ```text
//! set_search ─► SearchDebouncer ─┐
//! set_filter ───────────────────►│
//! set_sort ─────────────────────►├─► QueryComposer ─► QueryExecutor ─► results / loading / error
//! set_pagination ───────────────►│
//! refresh ──────────────────────►┘
//! ```
//!
//! The stages run as tasks on a current-thread runtime. Setter calls made
//! without an `.await` in between reach the composer as one burst.
//!
//! [`EntityCache`] and [`MutationGateway`] sit beside the pipeline and talk to
//! the store directly.

mod error;
pub use error::PipelineError;

mod config;
pub use config::{DEFAULT_DEBOUNCE, PipelineConfig};

mod event;
pub use event::{EventKind, MutationKind, PipelineEvent, PipelineObserver};

mod resource;
pub use resource::{Categories, Descriptor, Resource, Tasks};

mod view;
pub use view::{State, ViewState, ViewStateStore};

mod search;
pub use search::SearchDebouncer;

mod composer;
pub use composer::QueryComposer;

mod executor;
pub use executor::{InFlight, OperationStatus, QueryExecutor, QueryOutcome, QuerySnapshot, Snapshot};

mod cache;
pub use cache::EntityCache;

mod mutation;
pub use mutation::MutationGateway;

mod service;
pub use service::{CategoryService, Service, TaskService};

#[cfg(test)]
pub(crate) mod testing;
