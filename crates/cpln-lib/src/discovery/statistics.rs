//! Per-call listing statistics

use crate::models::Container;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Counters and diagnostics for one `list_advanced` call.
///
/// Owned by the call that produces it; workers report into it through the
/// collecting task, never directly.
#[derive(Debug, Clone, Serialize)]
pub struct ContainerListingStatistics {
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_seconds: Option<f64>,

    pub total_workloads_processed: usize,
    pub successful_workloads: usize,
    pub failed_workloads: usize,

    pub total_containers_found: usize,
    pub healthy_containers: usize,
    pub unhealthy_containers: usize,

    pub cache_hits: usize,
    pub cache_misses: usize,
    pub api_calls_made: usize,

    /// One formatted line per failure, the only record of what failed
    pub errors: Vec<String>,

    #[serde(skip)]
    finalized: bool,
}

impl Default for ContainerListingStatistics {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerListingStatistics {
    /// Start a new record stamped with the current time
    pub fn new() -> Self {
        Self {
            start_time: Utc::now(),
            end_time: None,
            duration_seconds: None,
            total_workloads_processed: 0,
            successful_workloads: 0,
            failed_workloads: 0,
            total_containers_found: 0,
            healthy_containers: 0,
            unhealthy_containers: 0,
            cache_hits: 0,
            cache_misses: 0,
            api_calls_made: 0,
            errors: Vec::new(),
            finalized: false,
        }
    }

    pub fn record_cache_hit(&mut self) {
        self.cache_hits += 1;
    }

    pub fn record_cache_miss(&mut self) {
        self.cache_misses += 1;
    }

    pub fn record_api_calls(&mut self, calls: usize) {
        self.api_calls_made += calls;
    }

    pub fn record_workload_success(&mut self) {
        self.total_workloads_processed += 1;
        self.successful_workloads += 1;
    }

    pub fn record_workload_failure(&mut self, workload: &str, error: impl std::fmt::Display) {
        self.total_workloads_processed += 1;
        self.failed_workloads += 1;
        self.errors.push(format!("Workload {workload}: {error}"));
    }

    pub fn record_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Stamp the end time and compute totals from the final container set.
    ///
    /// The healthy/unhealthy breakdown is only computed when
    /// `collect_health` is set. Calling this twice has no further effect.
    pub fn finalize(&mut self, containers: &[Container], collect_health: bool) {
        if self.finalized {
            return;
        }
        let end = Utc::now();
        self.end_time = Some(end);
        self.duration_seconds = Some(
            (end - self.start_time)
                .to_std()
                .map(|d| d.as_secs_f64())
                .unwrap_or(0.0),
        );
        self.total_containers_found = containers.len();
        if collect_health {
            self.healthy_containers = containers.iter().filter(|c| c.is_healthy()).count();
            self.unhealthy_containers = containers.len() - self.healthy_containers;
        }
        self.finalized = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::HealthStatus;

    fn container(name: &str, health: Option<HealthStatus>) -> Container {
        let mut c = Container::new(name, "img", "wl", "gvc", "loc");
        c.health_status = health;
        c
    }

    #[test]
    fn test_finalize_counts_health() {
        let containers = vec![
            container("a", Some(HealthStatus::Healthy)),
            container("b", Some(HealthStatus::Degraded)),
            container("c", None),
        ];
        let mut stats = ContainerListingStatistics::new();
        stats.finalize(&containers, true);

        assert!(stats.is_finalized());
        assert_eq!(stats.total_containers_found, 3);
        assert_eq!(stats.healthy_containers, 1);
        assert_eq!(stats.unhealthy_containers, 2);
        assert!(stats.end_time.is_some());
        assert!(stats.duration_seconds.unwrap() >= 0.0);
    }

    #[test]
    fn test_finalize_without_health_breakdown() {
        let containers = vec![container("a", Some(HealthStatus::Healthy))];
        let mut stats = ContainerListingStatistics::new();
        stats.finalize(&containers, false);

        assert_eq!(stats.total_containers_found, 1);
        assert_eq!(stats.healthy_containers, 0);
        assert_eq!(stats.unhealthy_containers, 0);
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let mut stats = ContainerListingStatistics::new();
        stats.finalize(&[container("a", None)], true);
        let end = stats.end_time;
        stats.finalize(&[], true);

        assert_eq!(stats.end_time, end);
        assert_eq!(stats.total_containers_found, 1);
    }

    #[test]
    fn test_workload_counters_and_serialization() {
        let mut stats = ContainerListingStatistics::new();
        stats.record_workload_success();
        stats.record_workload_failure("api", "API error (500): boom");
        stats.record_cache_miss();
        stats.record_api_calls(3);

        assert_eq!(stats.total_workloads_processed, 2);
        assert_eq!(stats.successful_workloads, 1);
        assert_eq!(stats.failed_workloads, 1);
        assert_eq!(stats.errors, vec!["Workload api: API error (500): boom"]);

        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(value["api_calls_made"], 3);
        assert_eq!(value["cache_misses"], 1);
        assert!(value.get("finalized").is_none());
    }
}
