/// Metrics for the reward service.
#[derive(Debug, Clone, prometheus_metric_storage::MetricStorage)]
#[metric(subsystem = "rewarder")]
pub struct Metrics {
    /// Processed claims by outcome, `success` or the error kind.
    #[metric(labels("outcome"))]
    pub claims: prometheus::IntCounterVec,

    /// Contract operations by lifecycle state.
    #[metric(labels("state"))]
    pub operations: prometheus::IntCounterVec,

    /// Pipeline stages entered.
    #[metric(labels("stage"))]
    pub stages: prometheus::IntCounterVec,

    /// Time from receiving a claim to its final outcome.
    #[metric(buckets(0.1, 0.5, 1, 2, 5, 10, 20, 30, 60, 120))]
    pub processing_seconds: prometheus::Histogram,

    /// Gas used by confirmed reward transactions.
    #[metric(buckets(21000, 50000, 75000, 100000, 150000, 200000, 300000, 500000))]
    pub gas_used: prometheus::Histogram,
}

/// Setup the metrics registry.
pub fn init() {
    observe::metrics::setup_registry_reentrant(Some("based_quiz".to_owned()), None);
}

/// Get the metrics instance.
pub fn get() -> &'static Metrics {
    Metrics::instance(observe::metrics::get_storage_registry())
        .expect("unexpected error getting metrics instance")
}
