//! Control Plane container CLI
//!
//! A command-line tool for listing, counting and health-checking the
//! containers behind Control Plane workloads.

mod commands;
mod config;
mod output;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use commands::containers;
use cpln_lib::{AdvancedListingOptions, ApiClient, ClientConfig, ContainerCollection};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Control Plane container CLI
#[derive(Parser)]
#[command(name = "cpln")]
#[command(author, version, about = "List and inspect Control Plane containers", long_about = None)]
pub struct Cli {
    /// API endpoint URL
    #[arg(long, env = "CPLN_ENDPOINT", global = true)]
    pub endpoint: Option<String>,

    /// Organization name
    #[arg(long, env = "CPLN_ORG", global = true)]
    pub org: Option<String>,

    /// API token
    #[arg(long, env = "CPLN_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// Global virtual cloud to query (falls back to the configured default)
    #[arg(long, env = "CPLN_GVC", global = true)]
    pub gvc: Option<String>,

    /// Output format
    #[arg(long, short, global = true)]
    pub format: Option<output::OutputFormat>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List containers across workloads
    List(ListArgs),

    /// Count containers (performs a full listing)
    Count(ListArgs),

    /// Show a single container
    Get {
        /// Container name
        container: String,

        /// Workload the container belongs to
        #[arg(long, short)]
        workload: String,

        /// Only search this location
        #[arg(long, short)]
        location: Option<String>,
    },

    /// Refresh live status and show container health
    Health(ListArgs),
}

#[derive(Args, Clone)]
pub struct ListArgs {
    /// Only list containers of this workload
    #[arg(long, short)]
    pub workload: Option<String>,

    /// Only query this location
    #[arg(long, short)]
    pub location: Option<String>,

    /// Fetch workloads one at a time, in listing order
    #[arg(long)]
    pub sequential: bool,

    /// Concurrent workload fetches
    #[arg(long, default_value_t = 5)]
    pub workers: usize,

    /// Bypass the listing cache
    #[arg(long)]
    pub no_cache: bool,

    /// Keep at most this many containers
    #[arg(long)]
    pub max_results: Option<usize>,

    /// Only show healthy containers
    #[arg(long)]
    pub healthy_only: bool,

    /// Include platform system containers
    #[arg(long)]
    pub include_system: bool,

    /// Retries on API throttling
    #[arg(long, default_value_t = 3)]
    pub max_retries: u32,

    /// Print listing statistics
    #[arg(long)]
    pub stats: bool,
}

impl ListArgs {
    fn options(&self) -> AdvancedListingOptions {
        let mut builder = AdvancedListingOptions::builder()
            .parallel(!self.sequential)
            .max_workers(self.workers)
            .cache(!self.no_cache)
            .max_retries(self.max_retries)
            .filter_unhealthy(self.healthy_only)
            .include_system_containers(self.include_system);
        if let Some(max) = self.max_results {
            builder = builder.pagination(true).max_results(max);
        }
        builder.build()
    }
}

fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Flag first, then the config file's `default_format`, then table
fn resolve_format(flag: Option<output::OutputFormat>, configured: Option<&str>) -> output::OutputFormat {
    flag.or_else(|| configured.and_then(|f| output::OutputFormat::from_str(f, true).ok()))
        .unwrap_or_default()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let file_config = config::Config::load()?;

    let format = resolve_format(cli.format, file_config.default_format.as_deref());

    let gvc = cli
        .gvc
        .or(file_config.default_gvc)
        .context("No GVC given (use --gvc, CPLN_GVC or default_gvc in the config file)")?;
    let org = cli
        .org
        .or(file_config.org)
        .context("No organization given (use --org or CPLN_ORG)")?;
    let token = cli
        .token
        .context("No API token given (use --token or CPLN_TOKEN)")?;

    let mut client_config = ClientConfig::new(org, token);
    if let Some(endpoint) = cli.endpoint.or(file_config.endpoint) {
        client_config = client_config.with_endpoint(endpoint);
    }
    tracing::debug!(endpoint = %client_config.endpoint, org = %client_config.org, gvc = %gvc, "Connecting");
    let client = ApiClient::new(client_config).context("Failed to create API client")?;
    let collection = ContainerCollection::from_client(Arc::new(client));

    match cli.command {
        Commands::List(args) => {
            containers::list_containers(&collection, &gvc, &args, format).await?;
        }
        Commands::Count(args) => {
            containers::count_containers(&collection, &gvc, &args, format).await?;
        }
        Commands::Get {
            container,
            workload,
            location,
        } => {
            containers::get_container(
                &collection,
                &gvc,
                &workload,
                &container,
                location.as_deref(),
                format,
            )
            .await?;
        }
        Commands::Health(args) => {
            containers::show_health(&collection, &gvc, &args, format).await?;
        }
    }

    Ok(())
}
