//! Container discovery for the Control Plane API
//!
//! This crate provides the core functionality for:
//! - Parsing workload deployment payloads into container records
//! - Deployment status interpretation and health evaluation
//! - Cached, retrying, concurrent container listing
//! - HTTP transport and client configuration
//! - Metrics and structured logging

pub mod api;
pub mod discovery;
pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod status;

pub use api::{ApiClient, ClientConfig};
pub use discovery::{
    AdvancedListingOptions, ContainerCollection, ContainerListingStatistics, DeploymentFetcher,
    RefreshSummary, WorkloadFetcher,
};
pub use error::{Error, Result};
pub use health::{evaluate_health_status, get_health_summary, HealthStatus, HealthSummary};
pub use models::*;
pub use observability::{DiscoveryMetrics, StructuredLogger};
pub use status::{parse_deployment_status, StatusInfo};
