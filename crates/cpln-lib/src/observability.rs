//! Observability for container discovery
//!
//! Provides:
//! - Prometheus metrics (listing latency, cache hits/misses, API calls, failures, retries)
//! - Structured event logging with tracing

use crate::discovery::ContainerListingStatistics;
use prometheus::{register_histogram, register_int_counter, Histogram, IntCounter};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for listing latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<DiscoveryMetricsInner> = OnceLock::new();

struct DiscoveryMetricsInner {
    listing_latency_seconds: Histogram,
    cache_hits: IntCounter,
    cache_misses: IntCounter,
    api_calls: IntCounter,
    failed_workloads: IntCounter,
    retries: IntCounter,
}

impl DiscoveryMetricsInner {
    fn new() -> Self {
        Self {
            listing_latency_seconds: register_histogram!(
                "cpln_container_listing_latency_seconds",
                "Wall time of a container listing call",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register listing_latency_seconds"),

            cache_hits: register_int_counter!(
                "cpln_container_cache_hits_total",
                "Container listings served from the cache"
            )
            .expect("Failed to register cache_hits"),

            cache_misses: register_int_counter!(
                "cpln_container_cache_misses_total",
                "Container listings that had to be fetched"
            )
            .expect("Failed to register cache_misses"),

            api_calls: register_int_counter!(
                "cpln_api_calls_total",
                "Workload and deployment requests issued during discovery"
            )
            .expect("Failed to register api_calls"),

            failed_workloads: register_int_counter!(
                "cpln_failed_workloads_total",
                "Workloads whose containers could not be fetched"
            )
            .expect("Failed to register failed_workloads"),

            retries: register_int_counter!(
                "cpln_rate_limit_retries_total",
                "Retries triggered by API throttling"
            )
            .expect("Failed to register retries"),
        }
    }
}

/// Handle to the process-global discovery metrics.
///
/// Clones share the same underlying metrics.
#[derive(Clone)]
pub struct DiscoveryMetrics {
    inner: &'static DiscoveryMetricsInner,
}

impl Default for DiscoveryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl DiscoveryMetrics {
    /// Create a handle, registering the metrics on first use
    pub fn new() -> Self {
        Self {
            inner: GLOBAL_METRICS.get_or_init(DiscoveryMetricsInner::new),
        }
    }

    pub fn observe_listing_latency(&self, duration_secs: f64) {
        self.inner.listing_latency_seconds.observe(duration_secs);
    }

    pub fn inc_cache_hits(&self) {
        self.inner.cache_hits.inc();
    }

    pub fn inc_cache_misses(&self) {
        self.inner.cache_misses.inc();
    }

    pub fn add_api_calls(&self, calls: u64) {
        self.inner.api_calls.inc_by(calls);
    }

    pub fn inc_failed_workloads(&self) {
        self.inner.failed_workloads.inc();
    }

    pub fn inc_retries(&self) {
        self.inner.retries.inc();
    }

    pub fn cache_hits(&self) -> u64 {
        self.inner.cache_hits.get()
    }

    pub fn retries(&self) -> u64 {
        self.inner.retries.get()
    }
}

/// Structured logger for discovery events
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    component: String,
}

impl Default for StructuredLogger {
    fn default() -> Self {
        Self::new("container-discovery")
    }
}

impl StructuredLogger {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
        }
    }

    /// Log the outcome of a listing call
    pub fn log_listing_completed(
        &self,
        gvc: &str,
        workload: Option<&str>,
        location: Option<&str>,
        stats: &ContainerListingStatistics,
    ) {
        info!(
            event = "listing_completed",
            component = %self.component,
            gvc = %gvc,
            workload = ?workload,
            location = ?location,
            containers = stats.total_containers_found,
            healthy = stats.healthy_containers,
            workloads_processed = stats.total_workloads_processed,
            failed_workloads = stats.failed_workloads,
            cache_hits = stats.cache_hits,
            api_calls = stats.api_calls_made,
            duration_seconds = ?stats.duration_seconds,
            "Container listing completed"
        );
    }

    /// Log a workload whose containers could not be fetched
    pub fn log_workload_failed(&self, gvc: &str, workload: &str, error: &str) {
        warn!(
            event = "workload_failed",
            component = %self.component,
            gvc = %gvc,
            workload = %workload,
            error = %error,
            "Failed to fetch workload containers"
        );
    }

    pub fn log_cache_cleared(&self, entries: usize) {
        info!(
            event = "cache_cleared",
            component = %self.component,
            entries = entries,
            "Container cache cleared"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_handles_share_registry() {
        let first = DiscoveryMetrics::new();
        let second = DiscoveryMetrics::default();

        let before = second.cache_hits();
        first.inc_cache_hits();
        assert!(second.cache_hits() > before);

        first.inc_cache_misses();
        first.add_api_calls(3);
        first.inc_failed_workloads();
        first.observe_listing_latency(0.2);
    }

    #[test]
    fn test_structured_logger_events() {
        let logger = StructuredLogger::default();
        let mut stats = ContainerListingStatistics::new();
        stats.finalize(&[], true);

        logger.log_listing_completed("prod", Some("api"), None, &stats);
        logger.log_workload_failed("prod", "api", "API error (500): boom");
        logger.log_cache_cleared(2);
    }
}
