use prometheus::{
    HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder, proto::MetricFamily,
};
use taskboard_core::{EventKind, PipelineEvent, PipelineObserver};
use tracing::trace;

const NAMESPACE: &str = "taskboard";

/// Pipeline metrics backed by a Prometheus registry.
#[derive(Clone)]
pub struct PrometheusObserver {
    registry: Registry,
    queries: IntCounterVec,
    query_duration: HistogramVec,
    discarded: IntCounterVec,
    mutations: IntCounterVec,
    cache_loads: IntCounterVec,
}

impl PrometheusObserver {
    /// Register all metrics in a fresh registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        Self::with_registry(Registry::new())
    }

    /// Register all metrics in `registry`.
    pub fn with_registry(registry: Registry) -> Result<Self, prometheus::Error> {
        let queries = IntCounterVec::new(
            Opts::new("queries_total", "Executed queries by outcome").namespace(NAMESPACE),
            &["entity", "outcome"],
        )?;
        let query_duration = HistogramVec::new(
            HistogramOpts::new("query_duration_seconds", "Store round-trip time of queries")
                .namespace(NAMESPACE)
                .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
            &["entity"],
        )?;
        let discarded = IntCounterVec::new(
            Opts::new(
                "queries_discarded_total",
                "Query outcomes dropped because a newer query was submitted",
            )
            .namespace(NAMESPACE),
            &["entity"],
        )?;
        let mutations = IntCounterVec::new(
            Opts::new("mutations_total", "Create, update and delete calls by outcome")
                .namespace(NAMESPACE),
            &["entity", "op", "outcome"],
        )?;
        let cache_loads = IntCounterVec::new(
            Opts::new("cache_loads_total", "Full-collection loads into the entity cache")
                .namespace(NAMESPACE),
            &["entity"],
        )?;

        registry.register(Box::new(queries.clone()))?;
        registry.register(Box::new(query_duration.clone()))?;
        registry.register(Box::new(discarded.clone()))?;
        registry.register(Box::new(mutations.clone()))?;
        registry.register(Box::new(cache_loads.clone()))?;

        Ok(Self {
            registry,
            queries,
            query_duration,
            discarded,
            mutations,
            cache_loads,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Current metrics in the Prometheus text exposition format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        TextEncoder::new().encode_to_string(&self.gather())
    }
}

impl PipelineObserver for PrometheusObserver {
    fn on_event(&self, event: &PipelineEvent) {
        let entity = event.entity;
        match event.kind {
            EventKind::QueryCompleted | EventKind::QueryFailed => {
                let outcome = if event.kind == EventKind::QueryCompleted {
                    "ok"
                } else {
                    "error"
                };
                self.queries.with_label_values(&[entity, outcome]).inc();
                if let Some(elapsed) = event.elapsed {
                    self.query_duration
                        .with_label_values(&[entity])
                        .observe(elapsed.as_secs_f64());
                }
            }
            EventKind::QueryDiscarded => {
                self.discarded.with_label_values(&[entity]).inc();
            }
            EventKind::MutationCompleted | EventKind::MutationFailed => {
                let op = event.mutation.map_or("unknown", |m| m.as_str());
                let outcome = if event.kind == EventKind::MutationCompleted {
                    "ok"
                } else {
                    "error"
                };
                self.mutations.with_label_values(&[entity, op, outcome]).inc();
            }
            EventKind::CacheLoaded => {
                self.cache_loads.with_label_values(&[entity]).inc();
            }
            kind => trace!(?kind, entity, "event not measured"),
        }
    }
}
