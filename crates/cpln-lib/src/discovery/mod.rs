//! Container discovery
//!
//! The platform exposes no container endpoint, so containers are
//! reconstructed from workload deployment payloads. This module holds:
//! - The narrow transport seams ([`WorkloadFetcher`], [`DeploymentFetcher`])
//! - Payload parsing into [`Container`](crate::models::Container) records
//! - A TTL cache keyed by `(gvc, location, workload)`
//! - Throttling-aware retry and a bounded worker pool
//! - The [`ContainerCollection`] orchestrator tying them together

mod cache;
mod collection;
mod options;
pub mod parser;
mod pool;
mod retry;
mod statistics;


pub use async_trait::async_trait;
pub use cache::{cache_key, CacheEntry, ContainerCache};
pub use collection::{ContainerCollection, RefreshSummary};
pub use options::{AdvancedListingOptions, AdvancedListingOptionsBuilder, ProgressCallback};
pub use parser::{
    infer_workload_locations, is_system_container, parse_deployment_containers,
    parse_job_containers, parse_workload_names, parse_workload_spec_containers,
    SYSTEM_CONTAINERS,
};
pub use pool::run_bounded;
pub use retry::{next_delay, with_retry, RetryPolicy};
pub use statistics::ContainerListingStatistics;

use crate::error::Result;
use serde_json::Value;

/// Fetches workload definitions from the API
#[async_trait]
pub trait WorkloadFetcher: Send + Sync {
    /// Fetch one workload by name, or the workload listing of a GVC when
    /// `workload` is `None`
    async fn fetch_workload(&self, gvc: &str, workload: Option<&str>) -> Result<Value>;
}

/// Fetches the live, per-location deployment of a workload
#[async_trait]
pub trait DeploymentFetcher: Send + Sync {
    async fn fetch_workload_deployment(
        &self,
        gvc: &str,
        workload: &str,
        location: &str,
    ) -> Result<Value>;
}
