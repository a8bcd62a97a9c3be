//! Deployment status interpretation
//!
//! Flattens the nested `status` object of a workload deployment into a
//! [`StatusInfo`] whose fields always exist. Parsing is defensive: wrong
//! types degrade to `false`/`None` instead of failing.

use crate::discovery::parser::scalar_string;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Flattened view of a deployment status payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusInfo {
    pub endpoint: Option<String>,
    pub remote: Option<String>,
    pub last_processed_version: Option<String>,
    pub expected_deployment_version: Option<String>,
    pub ready: bool,
    pub deploying: bool,
    pub message: Option<String>,

    // Latest entry of `versions[]`
    pub latest_version_name: Option<String>,
    pub latest_version_created: Option<String>,
    pub latest_version_workload: Option<i64>,
    pub latest_version_gvc: Option<i64>,
    pub latest_version_ready: Option<bool>,
    pub latest_version_message: Option<String>,
    pub latest_version_zone: Option<String>,

    // Latest entry of `jobExecutions[]`
    pub latest_job_workload_version: Option<i64>,
    pub latest_job_status: Option<String>,
    pub latest_job_start_time: Option<String>,
    pub latest_job_completion_time: Option<String>,
    pub latest_job_name: Option<String>,
    pub latest_job_replica: Option<String>,
    pub latest_job_condition_status: Option<String>,
    pub latest_job_condition_type: Option<String>,
    pub latest_job_condition_message: Option<String>,
    pub latest_job_condition_reason: Option<String>,
}

/// Status of one named container within a deployment's versions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerVersionStatus {
    pub ready: bool,
    pub version_ready: Option<bool>,
    pub version_name: Option<String>,
    pub version_zone: Option<String>,
    pub version_message: Option<String>,
    pub container_data: Option<Value>,
    pub total_replicas: Option<u32>,
    pub ready_replicas: Option<u32>,
}

/// Resource usage figures; the status schema does not carry them yet
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceMetrics {
    pub cpu_usage: Option<f64>,
    pub memory_usage: Option<f64>,
}

/// Replica figures; the status schema does not carry them yet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaMetrics {
    pub total_replicas: Option<u32>,
    pub ready_replicas: Option<u32>,
    pub restart_count: Option<u32>,
}

fn str_field(obj: &Value, key: &str) -> Option<String> {
    obj.get(key).and_then(scalar_string)
}

fn int_field(obj: &Value, key: &str) -> Option<i64> {
    obj.get(key).and_then(Value::as_i64)
}

/// Non-boolean values coerce to `false`
fn bool_field(obj: &Value, key: &str) -> bool {
    obj.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn last_entry<'a>(obj: &'a Value, key: &str) -> Option<&'a Value> {
    obj.get(key)
        .and_then(Value::as_array)
        .and_then(|entries| entries.last())
        .filter(|entry| entry.is_object())
}

/// Flatten a deployment `status` payload.
///
/// The most recent version and job execution are the last entries of
/// their arrays. Missing or malformed sections leave their fields `None`.
pub fn parse_deployment_status(raw: &Value) -> StatusInfo {
    let mut info = StatusInfo {
        endpoint: str_field(raw, "endpoint"),
        remote: str_field(raw, "remote"),
        last_processed_version: str_field(raw, "lastProcessedVersion"),
        expected_deployment_version: str_field(raw, "expectedDeploymentVersion"),
        ready: bool_field(raw, "ready"),
        deploying: bool_field(raw, "deploying"),
        message: str_field(raw, "message"),
        ..StatusInfo::default()
    };

    if let Some(version) = last_entry(raw, "versions") {
        info.latest_version_name = str_field(version, "name");
        info.latest_version_created = str_field(version, "created");
        info.latest_version_workload = int_field(version, "workload");
        info.latest_version_gvc = int_field(version, "gvc");
        info.latest_version_ready = version.get("ready").and_then(Value::as_bool);
        info.latest_version_message = str_field(version, "message");
        info.latest_version_zone = str_field(version, "zone");
    }

    if let Some(job) = last_entry(raw, "jobExecutions") {
        info.latest_job_workload_version = int_field(job, "workloadVersion");
        info.latest_job_status = str_field(job, "status");
        info.latest_job_start_time = str_field(job, "startTime");
        info.latest_job_completion_time = str_field(job, "completionTime");
        info.latest_job_name = str_field(job, "name");
        info.latest_job_replica = str_field(job, "replica");

        if let Some(condition) = last_entry(job, "conditions") {
            info.latest_job_condition_status = str_field(condition, "status");
            info.latest_job_condition_type = str_field(condition, "type");
            info.latest_job_condition_message = str_field(condition, "message");
            info.latest_job_condition_reason = str_field(condition, "reason");
        }
    }

    info
}

/// Find the status of `container_name` in a deployment's versions.
///
/// Versions are scanned newest first. When the container does not appear
/// in any version the result is not ready with zero replicas.
pub fn parse_container_status_from_versions(
    versions: &[Value],
    container_name: &str,
) -> ContainerVersionStatus {
    for version in versions.iter().rev() {
        let Some(container) = version
            .get("containers")
            .and_then(|c| c.get(container_name))
        else {
            continue;
        };

        let version_ready = version.get("ready").and_then(Value::as_bool);
        let resources = container.get("resources");
        let replica_count = |key: &str| {
            resources
                .and_then(|r| r.get(key))
                .and_then(Value::as_u64)
                .and_then(|n| u32::try_from(n).ok())
        };

        return ContainerVersionStatus {
            ready: version_ready.unwrap_or(false),
            version_ready,
            version_name: str_field(version, "name"),
            version_zone: str_field(version, "zone"),
            version_message: str_field(version, "message"),
            container_data: Some(container.clone()),
            total_replicas: replica_count("replicas"),
            ready_replicas: replica_count("replicasReady"),
        };
    }

    ContainerVersionStatus {
        ready: false,
        total_replicas: Some(0),
        ready_replicas: Some(0),
        ..ContainerVersionStatus::default()
    }
}

/// Resource usage hook. Always empty until the API exposes usage data.
pub fn extract_resource_metrics(_info: &StatusInfo) -> ResourceMetrics {
    ResourceMetrics::default()
}

/// Replica count hook. Always empty until the API exposes replica data.
pub fn calculate_replica_metrics(_info: &StatusInfo) -> ReplicaMetrics {
    ReplicaMetrics::default()
}
