// Metrics module for Prometheus observability
// Author: kelexine (https://github.com/kelexine)

mod registry;

pub use registry::{
    gather_metrics,
    EVENTS_TOTAL,
    CACHE_OPERATIONS,
    CACHE_STORES,
    NETWORK_FETCHES,
    FETCH_DURATION,
    NOTIFICATIONS,
};

/// Helper to record a handled lifecycle signal
pub fn record_event(event: &str, success: bool) {
    let status = if success { "ok" } else { "error" };
    EVENTS_TOTAL.with_label_values(&[event, status]).inc();
}

/// Helper to record fetch handling time by response source
pub fn record_fetch(source: &str, duration_secs: f64) {
    FETCH_DURATION.with_label_values(&[source]).observe(duration_secs);
}

/// Helper to record cache operations
pub fn record_cache_hit() {
    CACHE_OPERATIONS.with_label_values(&["hit"]).inc();
}

pub fn record_cache_miss() {
    CACHE_OPERATIONS.with_label_values(&["miss"]).inc();
}

pub fn record_cache_write(success: bool) {
    let op = if success { "write" } else { "write_failure" };
    CACHE_OPERATIONS.with_label_values(&[op]).inc();
}

pub fn record_precache(cached: usize, failed: usize) {
    CACHE_OPERATIONS.with_label_values(&["precache"]).inc_by(cached as f64);
    CACHE_OPERATIONS.with_label_values(&["precache_failure"]).inc_by(failed as f64);
}

pub fn record_eviction(success: bool) {
    let op = if success { "evict" } else { "evict_failure" };
    CACHE_OPERATIONS.with_label_values(&[op]).inc();
}

pub fn record_offline_fallback() {
    CACHE_OPERATIONS.with_label_values(&["fallback"]).inc();
}

pub fn update_store_count(count: usize) {
    CACHE_STORES.with_label_values(&["total"]).set(count as f64);
}

/// Helper to record network fetch outcomes
pub fn record_network_fetch(success: bool) {
    let outcome = if success { "response" } else { "failure" };
    NETWORK_FETCHES.with_label_values(&[outcome]).inc();
}

/// Helper to record notification events
pub fn record_notification(event: &str) {
    NOTIFICATIONS.with_label_values(&[event]).inc();
}
