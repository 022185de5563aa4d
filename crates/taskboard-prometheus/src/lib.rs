//! Prometheus metrics for the task board query pipeline.
//!
//! [`PrometheusObserver`] implements [`taskboard_core::PipelineObserver`] and
//! keeps its own [`Registry`].
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use taskboard_core::{PipelineConfig, PipelineObserver, TaskService};
//! use taskboard_prometheus::PrometheusObserver;
//! use taskboard_store::MemoryStore;
//!
//! # #[tokio::main(flavor = "current_thread")] async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let metrics = Arc::new(PrometheusObserver::new()?);
//! let observers: Vec<Arc<dyn PipelineObserver>> = vec![metrics.clone()];
//! let tasks = TaskService::with_observers(
//!     Arc::new(MemoryStore::new()),
//!     &PipelineConfig::default(),
//!     observers,
//! )?;
//! // ...
//! println!("{}", metrics.render()?);
//! # drop(tasks);
//! # Ok(())
//! # }
//! ```
//!
//! ## Metrics
//! - `taskboard_queries_total{entity, outcome}` - Counter
//! - `taskboard_query_duration_seconds{entity}` - Histogram
//! - `taskboard_queries_discarded_total{entity}` - Counter
//! - `taskboard_mutations_total{entity, op, outcome}` - Counter
//! - `taskboard_cache_loads_total{entity}` - Counter
//!
//! ## HTTP Server
//! This crate does NOT serve `/metrics`. Expose [`PrometheusObserver::render`]
//! through the application's HTTP framework.

mod backend;
pub use backend::PrometheusObserver;

pub use prometheus::{Encoder, Registry, TextEncoder};
