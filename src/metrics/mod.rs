// Private module declaration
mod server;

use prometheus::{
    HistogramOpts, HistogramVec, IntCounter, IntCounterVec,
    IntGauge, Opts, Registry,
};

// Re-export for public API
pub use server::metrics_handler;

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Provides metrics for:
// - Order store / command handler operations (throughput, latency, outcome)
// - Lifecycle transitions
// - Optimistic concurrency conflicts
// - Backend reachability
//
// All metrics are registered with Prometheus and can be scraped via /metrics
// ============================================================================

/// Central metrics registry for the order service
pub struct Metrics {
    registry: Registry,

    // Operation Metrics
    pub operations_total: IntCounterVec,
    pub operation_duration: HistogramVec,

    // Lifecycle Metrics
    pub transitions_total: IntCounterVec,
    pub update_conflicts_total: IntCounter,

    // Backend Metrics
    pub store_up: IntGauge,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let operations_total = IntCounterVec::new(
            Opts::new("order_operations_total", "Total order operations by outcome"),
            &["operation", "outcome"],
        )?;
        registry.register(Box::new(operations_total.clone()))?;

        let operation_duration = HistogramVec::new(
            HistogramOpts::new("order_operation_duration_seconds", "Order operation duration")
                .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["operation"],
        )?;
        registry.register(Box::new(operation_duration.clone()))?;

        let transitions_total = IntCounterVec::new(
            Opts::new("order_transitions_total", "Lifecycle transitions persisted"),
            &["transition"],
        )?;
        registry.register(Box::new(transitions_total.clone()))?;

        let update_conflicts_total = IntCounter::new(
            "order_update_conflicts_total",
            "Conditional updates rejected because the stored revision moved",
        )?;
        registry.register(Box::new(update_conflicts_total.clone()))?;

        let store_up = IntGauge::new(
            "order_store_up",
            "Result of the last store health check (0=Unreachable, 1=Reachable)",
        )?;
        registry.register(Box::new(store_up.clone()))?;

        Ok(Self {
            registry,
            operations_total,
            operation_duration,
            transitions_total,
            update_conflicts_total,
            store_up,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Helper to record a finished operation
    pub fn record_operation(&self, operation: &str, outcome: &str, duration_secs: f64) {
        self.operations_total.with_label_values(&[operation, outcome]).inc();
        self.operation_duration.with_label_values(&[operation]).observe(duration_secs);
    }

    /// Helper to record a persisted lifecycle transition
    pub fn record_transition(&self, transition: &str) {
        self.transitions_total.with_label_values(&[transition]).inc();
    }

    pub fn record_conflict(&self) {
        self.update_conflicts_total.inc();
    }

    pub fn set_store_up(&self, up: bool) {
        self.store_up.set(i64::from(up));
    }
}
