//! Core data models for container discovery

use crate::discovery::DeploymentFetcher;
use crate::error::{Error, Result};
use crate::health::{get_health_summary, HealthStatus};
use crate::status::{
    extract_resource_metrics, parse_container_status_from_versions, parse_deployment_status,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// CPU and memory limits declared for a container
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    pub cpu: Option<String>,
    pub memory: Option<String>,
}

/// A container reconstructed from workload deployment payloads.
///
/// The API has no container endpoint; these records are snapshots built
/// from deployment data and own no live connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub name: String,
    pub image: String,
    pub workload_name: String,
    pub gvc_name: String,
    pub location: String,

    pub status: Option<String>,
    pub health_status: Option<HealthStatus>,
    /// Why the last deployment evaluation produced `health_status`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_reason: Option<String>,
    pub ready_replicas: Option<u32>,
    pub total_replicas: Option<u32>,
    pub restart_count: Option<u32>,

    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub last_restart_time: Option<DateTime<Utc>>,

    pub environment_variables: BTreeMap<String, String>,
    pub resource_limits: ResourceLimits,
    /// Port declarations exactly as the API returned them
    pub ports: Vec<Value>,

    pub cpu_usage: Option<f64>,
    pub memory_usage: Option<f64>,

    pub deployment_name: Option<String>,
    pub version: Option<String>,
}

/// Partial status update; `None` fields leave the container unchanged
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusUpdate {
    pub status: Option<String>,
    pub health_status: Option<HealthStatus>,
    pub ready_replicas: Option<u32>,
    pub total_replicas: Option<u32>,
    pub restart_count: Option<u32>,
    pub cpu_usage: Option<f64>,
    pub memory_usage: Option<f64>,
}

/// Per-container health report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerHealthSummary {
    pub name: String,
    pub health_status: Option<HealthStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub is_healthy: bool,
    pub status: Option<String>,
    pub ready_replicas: Option<u32>,
    pub total_replicas: Option<u32>,
    pub restart_count: Option<u32>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Container {
    /// Create a container with identity fields set and everything else empty
    pub fn new(
        name: impl Into<String>,
        image: impl Into<String>,
        workload_name: impl Into<String>,
        gvc_name: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            workload_name: workload_name.into(),
            gvc_name: gvc_name.into(),
            location: location.into(),
            status: None,
            health_status: None,
            health_reason: None,
            ready_replicas: None,
            total_replicas: None,
            restart_count: None,
            created_at: None,
            updated_at: None,
            last_restart_time: None,
            environment_variables: BTreeMap::new(),
            resource_limits: ResourceLimits::default(),
            ports: Vec::new(),
            cpu_usage: None,
            memory_usage: None,
            deployment_name: None,
            version: None,
        }
    }

    /// Apply a partial status update and stamp `updated_at`
    pub fn update_status(&mut self, update: StatusUpdate) {
        if let Some(status) = update.status {
            self.status = Some(status);
        }
        if let Some(health) = update.health_status {
            self.health_status = Some(health);
            self.health_reason = None;
        }
        if let Some(ready) = update.ready_replicas {
            self.ready_replicas = Some(ready);
        }
        if let Some(total) = update.total_replicas {
            self.total_replicas = Some(total);
        }
        if let Some(restarts) = update.restart_count {
            self.restart_count = Some(restarts);
        }
        if let Some(cpu) = update.cpu_usage {
            self.cpu_usage = Some(cpu);
        }
        if let Some(memory) = update.memory_usage {
            self.memory_usage = Some(memory);
        }
        self.updated_at = Some(Utc::now());
    }

    /// Re-derive status and health from a deployment `status` payload
    pub fn update_status_from_deployment(&mut self, status: &Value) {
        let info = parse_deployment_status(status);
        let summary = get_health_summary(&info);
        let versions = status
            .get("versions")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let container_status = parse_container_status_from_versions(versions, &self.name);

        let reported = container_status
            .container_data
            .as_ref()
            .and_then(|data| data.get("status"))
            .and_then(Value::as_str)
            .map(str::to_string);
        let status_text = reported.unwrap_or_else(|| match summary.health_status {
            HealthStatus::Healthy => "running".to_string(),
            other => other.to_string(),
        });

        let (ready_replicas, total_replicas) = if container_status.container_data.is_some() {
            (container_status.ready_replicas, container_status.total_replicas)
        } else {
            (None, None)
        };
        let usage = extract_resource_metrics(&info);

        tracing::debug!(
            container = %self.name,
            workload = %self.workload_name,
            health = %summary.health_status,
            reason = %summary.reason,
            "Derived container health"
        );

        self.update_status(StatusUpdate {
            status: Some(status_text),
            health_status: Some(summary.health_status),
            ready_replicas,
            total_replicas,
            restart_count: None,
            cpu_usage: usage.cpu_usage,
            memory_usage: usage.memory_usage,
        });
        self.health_reason = Some(summary.reason);
    }

    /// Fetch the live deployment for this container and re-derive its status.
    ///
    /// On failure the container is left untouched.
    pub async fn refresh_status(&mut self, fetcher: &dyn DeploymentFetcher) -> Result<()> {
        let deployment = fetcher
            .fetch_workload_deployment(&self.gvc_name, &self.workload_name, &self.location)
            .await?;
        let status = deployment
            .get("status")
            .ok_or_else(|| Error::parse("Invalid deployment data: missing status"))?;
        self.update_status_from_deployment(status);
        Ok(())
    }

    /// Healthy when health is explicitly healthy; otherwise when all
    /// replicas are ready; otherwise not healthy.
    pub fn is_healthy(&self) -> bool {
        if let Some(health) = self.health_status {
            return health == HealthStatus::Healthy;
        }
        match (self.ready_replicas, self.total_replicas) {
            (Some(ready), Some(total)) => ready == total,
            _ => false,
        }
    }

    /// Current (cpu, memory) utilization, when known
    pub fn get_resource_utilization(&self) -> (Option<f64>, Option<f64>) {
        (self.cpu_usage, self.memory_usage)
    }

    pub fn get_health_summary(&self) -> ContainerHealthSummary {
        ContainerHealthSummary {
            name: self.name.clone(),
            health_status: self.health_status,
            reason: self.health_reason.clone(),
            is_healthy: self.is_healthy(),
            status: self.status.clone(),
            ready_replicas: self.ready_replicas,
            total_replicas: self.total_replicas,
            restart_count: self.restart_count,
            last_updated: self.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn container() -> Container {
        Container::new("test-container", "nginx:latest", "test-workload", "test-gvc", "us-east-1")
    }

    fn deployment_status() -> Value {
        json!({
            "ready": true,
            "deploying": false,
            "message": "Deployment ready",
            "versions": [{
                "name": "v1.0.0",
                "ready": true,
                "containers": {
                    "test-container": { "image": "nginx:latest", "status": "running" }
                }
            }],
            "jobExecutions": [{
                "status": "successful",
                "conditions": [{ "status": "True", "type": "Complete" }]
            }]
        })
    }

    #[test]
    fn test_update_status_sets_only_given_fields() {
        let mut c = container();
        c.update_status(StatusUpdate {
            status: Some("Running".to_string()),
            ready_replicas: Some(2),
            total_replicas: Some(3),
            ..StatusUpdate::default()
        });

        assert_eq!(c.status.as_deref(), Some("Running"));
        assert_eq!(c.ready_replicas, Some(2));
        assert_eq!(c.total_replicas, Some(3));
        assert!(c.health_status.is_none());
        assert!(c.restart_count.is_none());
        assert!(c.updated_at.is_some());
    }

    #[test]
    fn test_is_healthy_precedence() {
        let mut c = container();
        assert!(!c.is_healthy());

        c.ready_replicas = Some(2);
        c.total_replicas = Some(2);
        assert!(c.is_healthy());

        c.health_status = Some(HealthStatus::Degraded);
        assert!(!c.is_healthy());

        c.health_status = Some(HealthStatus::Healthy);
        c.ready_replicas = Some(0);
        assert!(c.is_healthy());
    }

    #[test]
    fn test_update_status_from_deployment() {
        let mut c = container();
        c.update_status_from_deployment(&deployment_status());

        assert_eq!(c.health_status, Some(HealthStatus::Healthy));
        assert_eq!(c.status.as_deref(), Some("running"));
        assert!(c.updated_at.is_some());
        assert!(c.cpu_usage.is_none());
    }

    #[test]
    fn test_update_status_from_deployment_without_container_entry() {
        let mut c = container();
        c.update_status_from_deployment(&json!({ "ready": false, "deploying": true }));

        assert_eq!(c.health_status, Some(HealthStatus::Degraded));
        assert_eq!(c.status.as_deref(), Some("degraded"));
        assert!(c.total_replicas.is_none());
    }

    #[test]
    fn test_container_health_summary() {
        let mut c = container();
        c.update_status_from_deployment(&deployment_status());

        let summary = c.get_health_summary();
        assert_eq!(summary.health_status, Some(HealthStatus::Healthy));
        assert!(summary.is_healthy);
        assert_eq!(summary.status.as_deref(), Some("running"));
        assert_eq!(summary.reason.as_deref(), Some("Deployment and version are ready"));
        assert!(summary.last_updated.is_some());

        let unevaluated = container().get_health_summary();
        assert!(unevaluated.reason.is_none());
    }

    #[test]
    fn test_health_reason_follows_latest_evaluation() {
        let mut c = container();
        c.update_status_from_deployment(&json!({ "ready": false, "deploying": true }));
        assert_eq!(c.health_reason.as_deref(), Some("Deployment is in progress"));

        let rendered = serde_json::to_value(c.get_health_summary()).unwrap();
        assert_eq!(rendered["reason"], "Deployment is in progress");
    }

    #[test]
    fn test_resource_utilization() {
        let mut c = container();
        assert_eq!(c.get_resource_utilization(), (None, None));

        c.update_status(StatusUpdate {
            cpu_usage: Some(0.5),
            memory_usage: Some(128.0),
            ..StatusUpdate::default()
        });
        assert_eq!(c.get_resource_utilization(), (Some(0.5), Some(128.0)));
    }

    #[test]
    fn test_serializes_health_lowercase() {
        let mut c = container();
        c.health_status = Some(HealthStatus::Unhealthy);

        let value = serde_json::to_value(&c).unwrap();
        assert_eq!(value["health_status"], json!("unhealthy"));
        assert_eq!(value["name"], json!("test-container"));
    }
}
