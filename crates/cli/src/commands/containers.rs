//! Container listing CLI commands

use anyhow::{Context, Result};
use cpln_lib::{Container, ContainerCollection, ContainerListingStatistics};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{
    color_health, color_status, format_replicas, print_info, print_json, print_rows,
    print_success, print_warning, OutputFormat,
};
use crate::ListArgs;

/// Row for the containers table
#[derive(Tabled)]
struct ContainerRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Workload")]
    workload: String,
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "Image")]
    image: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Health")]
    health: String,
    #[tabled(rename = "Replicas")]
    replicas: String,
}

impl From<&Container> for ContainerRow {
    fn from(c: &Container) -> Self {
        Self {
            name: c.name.clone(),
            workload: c.workload_name.clone(),
            location: c.location.clone(),
            image: c.image.clone(),
            status: color_status(c.status.as_deref()),
            health: color_health(c.health_status),
            replicas: format_replicas(c.ready_replicas, c.total_replicas),
        }
    }
}

#[derive(Serialize)]
struct ListingOutput<'a> {
    containers: &'a [Container],
    #[serde(skip_serializing_if = "Option::is_none")]
    statistics: Option<&'a ContainerListingStatistics>,
}

fn print_statistics(stats: &ContainerListingStatistics) {
    print_info(&format!(
        "{} containers from {} workloads ({} failed), {} API calls, cache {}/{} hit/miss, {:.2}s",
        stats.total_containers_found,
        stats.total_workloads_processed,
        stats.failed_workloads,
        stats.api_calls_made,
        stats.cache_hits,
        stats.cache_misses,
        stats.duration_seconds.unwrap_or_default(),
    ));
}

fn print_errors(stats: &ContainerListingStatistics) {
    for error in &stats.errors {
        print_warning(error);
    }
}

/// List containers in a GVC
pub async fn list_containers(
    collection: &ContainerCollection,
    gvc: &str,
    args: &ListArgs,
    format: OutputFormat,
) -> Result<()> {
    let (containers, stats) = collection
        .list_advanced(
            gvc,
            args.workload.as_deref(),
            args.location.as_deref(),
            &args.options(),
        )
        .await
        .context("Failed to list containers")?;

    let rows: Vec<ContainerRow> = containers.iter().map(ContainerRow::from).collect();
    let output = ListingOutput {
        containers: &containers,
        statistics: args.stats.then_some(&stats),
    };
    print_rows(&rows, &output, format)?;

    if format == OutputFormat::Table {
        print_errors(&stats);
        if args.stats {
            print_statistics(&stats);
        }
    }
    Ok(())
}

/// Count containers in a GVC
pub async fn count_containers(
    collection: &ContainerCollection,
    gvc: &str,
    args: &ListArgs,
    format: OutputFormat,
) -> Result<()> {
    let count = collection
        .count_containers(
            gvc,
            args.workload.as_deref(),
            args.location.as_deref(),
            &args.options(),
        )
        .await
        .context("Failed to count containers")?;

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({ "gvc": gvc, "count": count }))?,
        OutputFormat::Table => println!("{count}"),
    }
    Ok(())
}

/// Show one container with its live health
pub async fn get_container(
    collection: &ContainerCollection,
    gvc: &str,
    workload: &str,
    name: &str,
    location: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let found = collection
        .get(gvc, workload, name, location)
        .await
        .with_context(|| format!("Failed to get container {name}"))?;

    let Some(container) = found else {
        anyhow::bail!("Container {name} not found in workload {workload}");
    };

    match format {
        OutputFormat::Json => print_json(&container)?,
        OutputFormat::Table => {
            print_rows(&[ContainerRow::from(&container)], &container, format)?;
            if !container.environment_variables.is_empty() {
                print_info("Environment:");
                for (key, value) in &container.environment_variables {
                    println!("  {key}={value}");
                }
            }
        }
    }
    Ok(())
}

/// Refresh live status and report container health
pub async fn show_health(
    collection: &ContainerCollection,
    gvc: &str,
    args: &ListArgs,
    format: OutputFormat,
) -> Result<()> {
    let (containers, stats) = collection
        .get_containers_with_status(
            gvc,
            args.workload.as_deref(),
            args.location.as_deref(),
            &args.options(),
            true,
        )
        .await
        .context("Failed to check container health")?;

    match format {
        OutputFormat::Json => {
            let summaries: Vec<_> = containers.iter().map(Container::get_health_summary).collect();
            print_json(&summaries)?;
        }
        OutputFormat::Table => {
            let rows: Vec<ContainerRow> = containers.iter().map(ContainerRow::from).collect();
            print_rows(&rows, &containers, format)?;
            print_errors(&stats);
            for container in containers.iter().filter(|c| !c.is_healthy()) {
                if let Some(reason) = &container.health_reason {
                    print_warning(&format!("{}: {reason}", container.name));
                }
            }

            let healthy = containers.iter().filter(|c| c.is_healthy()).count();
            if healthy == containers.len() && !containers.is_empty() {
                print_success(&format!("All {healthy} containers healthy"));
            } else if !containers.is_empty() {
                print_warning(&format!(
                    "{} of {} containers not healthy",
                    containers.len() - healthy,
                    containers.len()
                ));
            }
            if args.stats {
                print_statistics(&stats);
            }
        }
    }
    Ok(())
}
