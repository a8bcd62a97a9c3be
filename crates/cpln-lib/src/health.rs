//! Health classification for workload deployments
//!
//! Derives a four-valued health status from a flattened [`StatusInfo`]
//! and records which rule produced it.

use crate::status::StatusInfo;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Job execution states that count as a failed job
const FAILED_JOB_STATES: &[&str] = &["failed", "invalid", "removed"];

/// Health status of a deployment or container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Deployment, version and latest job are all in order
    Healthy,
    /// Operational but in flight or partially ready
    Degraded,
    /// Deployment or job has failed
    Unhealthy,
    /// Signals did not match any known combination
    Unknown,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Unhealthy => "unhealthy",
            HealthStatus::Unknown => "unknown",
        }
    }

    /// Returns true if the workload is at least partially serving
    pub fn is_operational(&self) -> bool {
        matches!(self, HealthStatus::Healthy | HealthStatus::Degraded)
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HealthStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "healthy" => Ok(HealthStatus::Healthy),
            "degraded" => Ok(HealthStatus::Degraded),
            "unhealthy" => Ok(HealthStatus::Unhealthy),
            "unknown" => Ok(HealthStatus::Unknown),
            other => Err(crate::Error::validation(format!(
                "unknown health status '{other}'"
            ))),
        }
    }
}

/// Health status together with the rule that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthSummary {
    pub health_status: HealthStatus,
    /// Which branch of the decision table fired
    pub reason: String,
    pub deployment_ready: bool,
    pub deployment_deploying: bool,
    pub version_ready: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
}

fn is_failed_job(job_status: Option<&str>) -> bool {
    job_status.is_some_and(|s| FAILED_JOB_STATES.contains(&s))
}

/// Run the decision table, returning the status and the reason for it
fn classify(info: &StatusInfo) -> (HealthStatus, String) {
    let job_status = info.latest_job_status.as_deref().map(str::to_ascii_lowercase);
    let job_status = job_status.as_deref();

    if info.deploying {
        return (HealthStatus::Degraded, "Deployment is in progress".to_string());
    }

    match (info.ready, info.latest_version_ready) {
        (true, Some(true)) => match job_status {
            None | Some("successful") => (
                HealthStatus::Healthy,
                "Deployment and version are ready".to_string(),
            ),
            Some("active") => (
                HealthStatus::Degraded,
                "Job execution is still active".to_string(),
            ),
            Some(s) if is_failed_job(Some(s)) => (
                HealthStatus::Unhealthy,
                format!("Latest job execution is {s}"),
            ),
            Some(s) => (HealthStatus::Unknown, format!("Unrecognized job status '{s}'")),
        },
        (true, None) => {
            if is_failed_job(job_status) {
                (
                    HealthStatus::Degraded,
                    "Deployment is ready but latest job execution failed".to_string(),
                )
            } else {
                (
                    HealthStatus::Healthy,
                    "Deployment is ready, version readiness not reported".to_string(),
                )
            }
        }
        (false, Some(false)) => (
            HealthStatus::Unhealthy,
            "Deployment and version are not ready".to_string(),
        ),
        (false, _) => (HealthStatus::Degraded, "Deployment is not ready".to_string()),
        (true, Some(false)) => (
            HealthStatus::Unknown,
            "Deployment is ready but version is not".to_string(),
        ),
    }
}

/// Evaluate health from a flattened deployment status.
///
/// Precedence: an in-flight deployment is always degraded; a ready
/// deployment with a ready version defers to the latest job; a ready
/// deployment with no version signal is healthy unless its job failed;
/// a deployment that is not ready is unhealthy only when its version is
/// explicitly not ready. Anything else is unknown.
pub fn evaluate_health_status(info: &StatusInfo) -> HealthStatus {
    classify(info).0
}

/// Evaluate health and attach the reason and the signals used
pub fn get_health_summary(info: &StatusInfo) -> HealthSummary {
    let (health_status, reason) = classify(info);
    HealthSummary {
        health_status,
        reason,
        deployment_ready: info.ready,
        deployment_deploying: info.deploying,
        version_ready: info.latest_version_ready,
        job_status: info.latest_job_status.clone(),
        status_message: info.message.clone(),
    }
}
