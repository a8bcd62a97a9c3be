//! Payload parsing into [`Container`] records
//!
//! Validates the required nested path of each payload kind and flattens
//! the container entries it holds. Entries that are not objects are
//! skipped; a missing required path is a [`Error::Parse`].

use crate::error::{Error, Result};
use crate::models::{Container, ResourceLimits};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Platform-injected containers hidden from listings
pub const SYSTEM_CONTAINERS: &[&str] = &["cpln-mounter"];

/// Locations probed when a workload does not declare any
pub const DEFAULT_LOCATIONS: &[&str] = &[
    "aws-us-east-1",
    "aws-us-west-2",
    "aws-eu-west-1",
    "gcp-us-central1",
    "azure-eastus",
];

/// Returns true if `name` is a platform system container
pub fn is_system_container(name: &str) -> bool {
    SYSTEM_CONTAINERS.contains(&name)
}

/// Render a JSON scalar as a string; `null`, arrays and objects yield `None`
pub(crate) fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
    let raw = value?.as_str()?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Identity shared by every container produced from one payload
struct Owner<'a> {
    workload_name: &'a str,
    gvc_name: &'a str,
    location: &'a str,
    deployment_name: Option<String>,
    version: Option<String>,
    created_at: Option<DateTime<Utc>>,
}

impl Owner<'_> {
    fn container(&self, name: &str, data: &Map<String, Value>) -> Container {
        let mut container = Container::new(
            name,
            data.get("image").and_then(Value::as_str).unwrap_or_default(),
            self.workload_name,
            self.gvc_name,
            self.location,
        );
        container.environment_variables = environment_variables(data.get("env"));
        container.resource_limits = resource_limits(data.get("resources"));
        container.ports = data
            .get("ports")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        container.deployment_name = self.deployment_name.clone();
        container.version = self.version.clone();
        container.created_at = self.created_at;
        container
    }
}

/// `[{name, value}]` into a name to value map; incomplete entries are dropped
fn environment_variables(env: Option<&Value>) -> BTreeMap<String, String> {
    env.and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|entry| {
            let name = entry.get("name")?.as_str()?;
            let value = scalar_string(entry.get("value")?)?;
            Some((name.to_string(), value))
        })
        .collect()
}

fn resource_limits(resources: Option<&Value>) -> ResourceLimits {
    let field = |key: &str| resources.and_then(|r| r.get(key)).and_then(scalar_string);
    ResourceLimits {
        cpu: field("cpu"),
        memory: field("memory"),
    }
}

/// Version label for a deployment version entry
fn version_label(version: &Value) -> Option<String> {
    ["version", "name", "workload"]
        .iter()
        .find_map(|key| version.get(*key).and_then(scalar_string))
}

/// Parse containers from a workload deployment payload.
///
/// Requires `status.versions`. Each version contributes the entries of its
/// `containers` map, keyed by container name.
pub fn parse_deployment_containers(
    deployment: &Value,
    workload_name: &str,
    gvc_name: &str,
    location: &str,
) -> Result<Vec<Container>> {
    let versions = deployment
        .get("status")
        .and_then(|s| s.get("versions"))
        .ok_or_else(|| Error::parse("Invalid deployment data: missing status.versions"))?
        .as_array()
        .ok_or_else(|| Error::parse("Invalid deployment data: status.versions is not a list"))?;

    let deployment_name = deployment
        .get("metadata")
        .and_then(|m| m.get("name"))
        .or_else(|| deployment.get("name"))
        .and_then(scalar_string);

    let mut containers = Vec::new();
    for version in versions {
        let Some(version_containers) = version.get("containers").and_then(Value::as_object)
        else {
            continue;
        };

        let owner = Owner {
            workload_name,
            gvc_name,
            location,
            deployment_name: deployment_name.clone(),
            version: version_label(version),
            created_at: timestamp(version.get("created")),
        };

        for (name, spec) in version_containers {
            if is_system_container(name) {
                continue;
            }
            let Some(spec) = spec.as_object() else {
                continue;
            };
            containers.push(owner.container(name, spec));
        }
    }

    Ok(containers)
}

/// Parse containers from a job execution payload (`spec.job.containers`)
pub fn parse_job_containers(
    job: &Value,
    workload_name: &str,
    gvc_name: &str,
    location: &str,
) -> Result<Vec<Container>> {
    let job_containers = job
        .get("spec")
        .and_then(|s| s.get("job"))
        .and_then(|j| j.get("containers"))
        .ok_or_else(|| Error::parse("Invalid job data: missing spec.job.containers"))?
        .as_array()
        .ok_or_else(|| Error::parse("Invalid job data: spec.job.containers is not a list"))?;

    let owner = Owner {
        workload_name,
        gvc_name,
        location,
        deployment_name: job.get("name").and_then(scalar_string),
        version: job.get("version").and_then(scalar_string),
        created_at: timestamp(job.get("created")),
    };

    Ok(named_containers(job_containers, &owner))
}

/// Parse containers from a workload `spec` (`spec.containers`)
pub fn parse_workload_spec_containers(
    spec: &Value,
    workload_name: &str,
    gvc_name: &str,
    location: &str,
) -> Result<Vec<Container>> {
    let spec_containers = spec
        .get("containers")
        .ok_or_else(|| Error::parse("Invalid workload spec: missing containers"))?
        .as_array()
        .ok_or_else(|| Error::parse("Invalid workload spec: containers is not a list"))?;

    let owner = Owner {
        workload_name,
        gvc_name,
        location,
        deployment_name: None,
        version: None,
        created_at: None,
    };

    Ok(named_containers(spec_containers, &owner))
}

fn named_containers(entries: &[Value], owner: &Owner<'_>) -> Vec<Container> {
    entries
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|data| {
            let name = data.get("name").and_then(Value::as_str).unwrap_or_default();
            (!is_system_container(name)).then(|| owner.container(name, data))
        })
        .collect()
}

/// Workload names from a workload listing payload (`items[].name`)
pub fn parse_workload_names(listing: &Value) -> Result<Vec<String>> {
    let items = listing
        .get("items")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::parse("Invalid workload listing: missing items"))?;

    Ok(items
        .iter()
        .filter_map(|item| item.get("name").and_then(Value::as_str))
        .map(str::to_string)
        .collect())
}

/// Locations a workload deploys to, from `spec.defaultOptions.locations`,
/// falling back to [`DEFAULT_LOCATIONS`]
pub fn infer_workload_locations(workload: &Value) -> Vec<String> {
    let declared: Vec<String> = workload
        .get("spec")
        .and_then(|s| s.get("defaultOptions"))
        .and_then(|o| o.get("locations"))
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect();

    if declared.is_empty() {
        DEFAULT_LOCATIONS.iter().map(|l| l.to_string()).collect()
    } else {
        declared
    }
}
