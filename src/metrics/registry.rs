// Prometheus metrics registry and collectors
// Author: kelexine (https://github.com/kelexine)

use lazy_static::lazy_static;
use prometheus::{
    CounterVec, HistogramVec, GaugeVec, Opts, Registry, TextEncoder, Encoder,
    register_counter_vec_with_registry, register_histogram_vec_with_registry,
    register_gauge_vec_with_registry,
};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // ============================================================================
    // LIFECYCLE METRICS
    // ============================================================================

    /// Lifecycle signals handled
    pub static ref EVENTS_TOTAL: CounterVec = register_counter_vec_with_registry!(
        Opts::new("agent_events_total", "Total lifecycle signals handled"),
        &["event", "status"], // status: ok, error
        REGISTRY
    ).unwrap();

    // ============================================================================
    // CACHE METRICS
    // ============================================================================

    /// Cache operations
    pub static ref CACHE_OPERATIONS: CounterVec = register_counter_vec_with_registry!(
        Opts::new("cache_operations_total", "Total cache operations"),
        &["operation"], // hit, miss, write, write_failure, precache, precache_failure, evict, evict_failure, fallback
        REGISTRY
    ).unwrap();

    /// Current number of cache stores
    pub static ref CACHE_STORES: GaugeVec = register_gauge_vec_with_registry!(
        Opts::new("cache_stores_current", "Current number of named cache stores"),
        &["type"], // type: total
        REGISTRY
    ).unwrap();

    // ============================================================================
    // FETCH METRICS
    // ============================================================================

    /// Network fetches issued by the agent
    pub static ref NETWORK_FETCHES: CounterVec = register_counter_vec_with_registry!(
        Opts::new("network_fetches_total", "Total network fetches"),
        &["outcome"], // outcome: response, failure
        REGISTRY
    ).unwrap();

    /// Fetch handling duration by response source
    pub static ref FETCH_DURATION: HistogramVec = register_histogram_vec_with_registry!(
        prometheus::HistogramOpts::new("fetch_duration_seconds", "Fetch handling duration in seconds")
            .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["source"], // source: cache, network, offline-fallback, error
        REGISTRY
    ).unwrap();

    // ============================================================================
    // NOTIFICATION METRICS
    // ============================================================================

    /// Notifications displayed and clicked
    pub static ref NOTIFICATIONS: CounterVec = register_counter_vec_with_registry!(
        Opts::new("notifications_total", "Total notification events"),
        &["event"], // event: shown, clicked, opened_window
        REGISTRY
    ).unwrap();
}

/// Gather all metrics and return as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}
