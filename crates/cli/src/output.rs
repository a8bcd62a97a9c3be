//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use cpln_lib::HealthStatus;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print rows as a table, or `data` as JSON
pub fn print_rows<R: Tabled, D: Serialize + ?Sized>(
    rows: &[R],
    data: &D,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("{}", "No containers found".yellow());
            } else {
                println!("{}", Table::new(rows).with(Style::rounded()));
            }
        }
        OutputFormat::Json => print_json(data)?,
    }
    Ok(())
}

pub fn print_json<D: Serialize + ?Sized>(data: &D) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(data)?);
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// `ready/total`, or `-` when either count is unknown
pub fn format_replicas(ready: Option<u32>, total: Option<u32>) -> String {
    match (ready, total) {
        (Some(ready), Some(total)) => format!("{ready}/{total}"),
        _ => "-".to_string(),
    }
}

/// Color a container status string
pub fn color_status(status: Option<&str>) -> String {
    let Some(status) = status else {
        return "-".dimmed().to_string();
    };
    match status.to_lowercase().as_str() {
        "running" | "healthy" | "ready" => status.green().to_string(),
        "pending" | "degraded" | "deploying" => status.yellow().to_string(),
        "unhealthy" | "error" | "failed" | "crashloopbackoff" => status.red().to_string(),
        _ => status.to_string(),
    }
}

/// Color a health status
pub fn color_health(health: Option<HealthStatus>) -> String {
    match health {
        Some(HealthStatus::Healthy) => "healthy".green().to_string(),
        Some(HealthStatus::Degraded) => "degraded".yellow().to_string(),
        Some(HealthStatus::Unhealthy) => "unhealthy".red().to_string(),
        Some(HealthStatus::Unknown) => "unknown".dimmed().to_string(),
        None => "-".dimmed().to_string(),
    }
}
