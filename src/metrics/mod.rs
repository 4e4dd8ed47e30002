//! Prometheus metrics, following the teacher's naming and registration
//! conventions (a `lazy_static` block registering `CounterVec`/`HistogramVec`
//! into a module-level `Registry`).

use crate::cache::CacheStats;
use crate::types::QueryType;
use lazy_static::lazy_static;
use prometheus::{
    histogram_opts, opts, register_counter_vec, register_gauge_vec, register_histogram_vec, CounterVec, Encoder,
    GaugeVec, HistogramVec, Registry, TextEncoder,
};
use std::time::Duration;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    pub static ref SEARCH_REQUESTS_TOTAL: CounterVec = register_counter_vec!(
        opts!("search_gateway_requests_total", "Total number of requests processed"),
        &["tenant", "classification"]
    )
    .unwrap();

    pub static ref SEARCH_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        histogram_opts!(
            "search_gateway_request_duration_seconds",
            "Request duration in seconds",
            vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.0]
        ),
        &["classification"]
    )
    .unwrap();

    pub static ref CACHE_HITS_TOTAL: CounterVec = register_counter_vec!(
        opts!("search_gateway_cache_hits_total", "Cache hits by endpoint"),
        &["endpoint"]
    )
    .unwrap();

    pub static ref CACHE_MISSES_TOTAL: CounterVec = register_counter_vec!(
        opts!("search_gateway_cache_misses_total", "Cache misses by endpoint"),
        &["endpoint"]
    )
    .unwrap();

    pub static ref ERRORS_TOTAL: CounterVec = register_counter_vec!(
        opts!("search_gateway_errors_total", "Total number of request errors by HTTP status"),
        &["status"]
    )
    .unwrap();

    /// Cache hits/misses broken down by tier (l1/l2), sampled from
    /// `CacheStats` on each `/metrics` scrape rather than incremented inline,
    /// since the counts already live as atomics on `ResponseCache`.
    pub static ref CACHE_TIER_HITS_TOTAL: GaugeVec = register_gauge_vec!(
        opts!("search_gateway_cache_tier_hits_total", "Cache hits by tier"),
        &["tier"]
    )
    .unwrap();

    pub static ref CACHE_TIER_MISSES_TOTAL: GaugeVec = register_gauge_vec!(
        opts!("search_gateway_cache_tier_misses_total", "Cache misses by tier"),
        &["tier"]
    )
    .unwrap();
}

fn register_all() {
    let _ = REGISTRY.register(Box::new(SEARCH_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(SEARCH_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(CACHE_HITS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(CACHE_MISSES_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(ERRORS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(CACHE_TIER_HITS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(CACHE_TIER_MISSES_TOTAL.clone()));
}

/// Thin recorder used from `AppState`, following the teacher's `Metrics`
/// convenience wrapper.
pub struct Metrics;

impl Metrics {
    pub fn new() -> Self {
        register_all();
        Metrics
    }

    pub fn record_request(&self, tenant: &str, classification: QueryType, elapsed: Duration) {
        let label = classification_label(classification);
        SEARCH_REQUESTS_TOTAL.with_label_values(&[tenant, label]).inc();
        SEARCH_REQUEST_DURATION_SECONDS
            .with_label_values(&[label])
            .observe(elapsed.as_secs_f64());
    }

    pub fn record_cache_hit(&self, endpoint: &str) {
        CACHE_HITS_TOTAL.with_label_values(&[endpoint]).inc();
    }

    pub fn record_cache_miss(&self, endpoint: &str) {
        CACHE_MISSES_TOTAL.with_label_values(&[endpoint]).inc();
    }

    pub fn record_error(&self, status: &str) {
        ERRORS_TOTAL.with_label_values(&[status]).inc();
    }

    /// Refresh the l1/l2 hit/miss gauges from the cache's own counters.
    /// Called right before an export so `/metrics` reflects current totals.
    pub fn observe_cache_stats(&self, stats: &CacheStats) {
        CACHE_TIER_HITS_TOTAL.with_label_values(&["l1"]).set(stats.l1_hits as f64);
        CACHE_TIER_HITS_TOTAL.with_label_values(&["l2"]).set(stats.l2_hits as f64);
        CACHE_TIER_MISSES_TOTAL.with_label_values(&["l1"]).set(stats.l1_misses as f64);
        CACHE_TIER_MISSES_TOTAL.with_label_values(&["l2"]).set(stats.l2_misses as f64);
    }

    pub fn export_text(&self) -> String {
        let families = REGISTRY.gather();
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        if encoder.encode(&families, &mut buffer).is_err() {
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

fn classification_label(classification: QueryType) -> &'static str {
    match classification {
        QueryType::Simple => "simple",
        QueryType::Complex => "complex",
        QueryType::Hybrid => "hybrid",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exports_nonempty_prometheus_text() {
        let metrics = Metrics::new();
        metrics.record_request("acme", QueryType::Simple, Duration::from_millis(5));
        let text = metrics.export_text();
        assert!(text.contains("search_gateway_requests_total"));
    }

    #[test]
    fn error_counter_is_exported() {
        let metrics = Metrics::new();
        metrics.record_error("504");
        let text = metrics.export_text();
        assert!(text.contains("search_gateway_errors_total"));
    }

    #[test]
    fn cache_tier_gauges_reflect_observed_stats() {
        let metrics = Metrics::new();
        let stats = CacheStats {
            l1_entries: 1,
            l1_hits: 7,
            l1_misses: 2,
            l2_hits: 3,
            l2_misses: 1,
            l2_faults: 0,
            evictions: 0,
            hit_rate: 0.0,
        };
        metrics.observe_cache_stats(&stats);
        let text = metrics.export_text();
        assert!(text.contains("search_gateway_cache_tier_hits_total"));
        assert!(text.contains("search_gateway_cache_tier_misses_total"));
    }
}
