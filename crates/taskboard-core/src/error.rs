use std::sync::Arc;

use taskboard_store::StoreError;
use thiserror::Error;

/// Failure of a query, mutation or cache load.
///
/// Cheap to clone so the same failure can sit on the results channel and be
/// returned to the caller.
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    #[error("{0}")]
    Store(Arc<StoreError>),

    #[error("could not get count")]
    CountUnavailable,

    #[error("failed to decode {entity} row: {reason}")]
    Decode { entity: &'static str, reason: String },

    /// Setter bursts only collapse when the stages share one thread.
    #[error("pipeline must be started on a current-thread tokio runtime")]
    UnsupportedRuntime,
}

impl From<StoreError> for PipelineError {
    fn from(err: StoreError) -> Self {
        PipelineError::Store(Arc::new(err))
    }
}
