//! Discovery orchestrator
//!
//! [`ContainerCollection`] turns workload and deployment payloads into
//! container listings. The advanced path layers the TTL cache, retry,
//! bounded fan-out, filtering, pagination and statistics on top of the
//! per-workload fetch.

use super::cache::{cache_key, ContainerCache};
use super::options::AdvancedListingOptions;
use super::parser::{
    infer_workload_locations, is_system_container, parse_deployment_containers,
    parse_workload_names,
};
use super::pool::run_bounded;
use super::retry::{with_retry, RetryPolicy};
use super::statistics::ContainerListingStatistics;
use super::{DeploymentFetcher, WorkloadFetcher};
use crate::error::{Error, Result};
use crate::models::Container;
use crate::observability::{DiscoveryMetrics, StructuredLogger};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Outcome of a batch status refresh
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub successful: usize,
    pub failed: usize,
}

impl RefreshSummary {
    pub fn total(&self) -> usize {
        self.successful + self.failed
    }
}

/// Everything one per-workload fetch needs, cheap to clone into a worker
#[derive(Clone)]
struct WorkloadFetch {
    workloads: Arc<dyn WorkloadFetcher>,
    deployments: Arc<dyn DeploymentFetcher>,
    gvc: String,
    location: Option<String>,
    policy: RetryPolicy,
    api_calls: Arc<AtomicUsize>,
}

impl WorkloadFetch {
    fn count_call(&self) {
        self.api_calls.fetch_add(1, Ordering::Relaxed);
    }

    /// Containers of one workload across its location(s).
    ///
    /// With an explicit location any deployment error fails the workload.
    /// With inferred locations, locations that fail for reasons other than
    /// throttling are skipped.
    async fn containers(&self, workload: &str) -> Result<Vec<Container>> {
        if let Some(location) = &self.location {
            return self.deployment_containers(workload, location).await;
        }

        let definition = with_retry(&self.policy, "fetch_workload", || {
            self.count_call();
            self.workloads.fetch_workload(&self.gvc, Some(workload))
        })
        .await?;

        let mut containers = Vec::new();
        for location in infer_workload_locations(&definition) {
            match self.deployment_containers(workload, &location).await {
                Ok(found) => containers.extend(found),
                Err(e) if e.is_rate_limited() => return Err(e),
                Err(e) => {
                    debug!(
                        gvc = %self.gvc,
                        workload = %workload,
                        location = %location,
                        error = %e,
                        "No usable deployment at location"
                    );
                }
            }
        }
        Ok(containers)
    }

    async fn deployment_containers(&self, workload: &str, location: &str) -> Result<Vec<Container>> {
        let deployment = with_retry(&self.policy, "fetch_workload_deployment", || {
            self.count_call();
            self.deployments
                .fetch_workload_deployment(&self.gvc, workload, location)
        })
        .await?;
        parse_deployment_containers(&deployment, workload, &self.gvc, location)
    }
}

/// Lists containers by reconstructing them from workload deployments
pub struct ContainerCollection {
    workloads: Arc<dyn WorkloadFetcher>,
    deployments: Arc<dyn DeploymentFetcher>,
    cache: ContainerCache,
    metrics: DiscoveryMetrics,
    logger: StructuredLogger,
}

impl ContainerCollection {
    pub fn new(workloads: Arc<dyn WorkloadFetcher>, deployments: Arc<dyn DeploymentFetcher>) -> Self {
        Self {
            workloads,
            deployments,
            cache: ContainerCache::new(),
            metrics: DiscoveryMetrics::new(),
            logger: StructuredLogger::default(),
        }
    }

    /// Build a collection over a single client implementing both fetchers
    pub fn from_client<C>(client: Arc<C>) -> Self
    where
        C: WorkloadFetcher + DeploymentFetcher + 'static,
    {
        Self::new(client.clone(), client)
    }

    fn fetch_context(
        &self,
        gvc: &str,
        location: Option<&str>,
        policy: RetryPolicy,
        api_calls: Arc<AtomicUsize>,
    ) -> WorkloadFetch {
        WorkloadFetch {
            workloads: self.workloads.clone(),
            deployments: self.deployments.clone(),
            gvc: gvc.to_string(),
            location: location.map(str::to_string),
            policy,
            api_calls,
        }
    }

    /// List the containers of one workload. No cache, no retry.
    pub async fn list(
        &self,
        gvc: &str,
        workload_name: &str,
        location: Option<&str>,
    ) -> Result<Vec<Container>> {
        require("gvc", gvc)?;
        require("workload_name", workload_name)?;

        let fetch = self.fetch_context(
            gvc,
            location,
            RetryPolicy::disabled(),
            Arc::new(AtomicUsize::new(0)),
        );
        fetch.containers(workload_name).await
    }

    /// Find a container by name within a workload
    pub async fn get(
        &self,
        gvc: &str,
        workload_name: &str,
        container_name: &str,
        location: Option<&str>,
    ) -> Result<Option<Container>> {
        require("container_name", container_name)?;
        let containers = self.list(gvc, workload_name, location).await?;
        Ok(containers.into_iter().find(|c| c.name == container_name))
    }

    /// List containers with caching, retry, fan-out, filtering and pagination.
    ///
    /// Without `workload_name` every workload in the GVC is listed. A failure
    /// to list the workloads yields an empty result with the error recorded
    /// in the statistics; a failure on one workload only drops that
    /// workload's containers.
    pub async fn list_advanced(
        &self,
        gvc: &str,
        workload_name: Option<&str>,
        location: Option<&str>,
        options: &AdvancedListingOptions,
    ) -> Result<(Vec<Container>, ContainerListingStatistics)> {
        require("gvc", gvc)?;
        let started = Instant::now();
        let mut stats = ContainerListingStatistics::new();
        let key = cache_key(gvc, location, workload_name);

        if options.enable_cache {
            if let Some(cached) = self.cache.get(&key) {
                debug!(key = %key, containers = cached.len(), "Container cache hit");
                stats.record_cache_hit();
                self.metrics.inc_cache_hits();
                stats.finalize(&cached, options.collect_statistics);
                return Ok((cached, stats));
            }
        }
        stats.record_cache_miss();
        self.metrics.inc_cache_misses();

        let api_calls = Arc::new(AtomicUsize::new(0));
        let fetch = self.fetch_context(gvc, location, options.retry_policy(), api_calls.clone());

        let workload_names = match workload_name {
            Some(name) => vec![name.to_string()],
            None => match self.workload_names(&fetch).await {
                Ok(names) => names,
                Err(e) => {
                    warn!(gvc = %gvc, error = %e, "Failed to list workloads");
                    stats.record_error(format!("Failed to list workloads in GVC {gvc}: {e}"));
                    self.finish(&mut stats, &[], &api_calls, started, options);
                    self.logger
                        .log_listing_completed(gvc, workload_name, location, &stats);
                    return Ok((Vec::new(), stats));
                }
            },
        };

        let outcomes = if options.enable_parallel {
            self.fetch_parallel(&fetch, workload_names, options).await
        } else {
            self.fetch_sequential(&fetch, workload_names, options).await
        };

        let mut containers = Vec::new();
        for (workload, outcome) in outcomes {
            match outcome {
                Ok(found) => {
                    stats.record_workload_success();
                    containers.extend(found);
                }
                Err(e) => {
                    self.metrics.inc_failed_workloads();
                    self.logger.log_workload_failed(gvc, &workload, &e.to_string());
                    stats.record_workload_failure(&workload, &e);
                }
            }
        }

        let containers = apply_filters(containers, options);
        self.finish(&mut stats, &containers, &api_calls, started, options);

        if options.enable_cache {
            self.cache.set(key, containers.clone(), options.cache_ttl());
        }

        self.logger
            .log_listing_completed(gvc, workload_name, location, &stats);
        Ok((containers, stats))
    }

    async fn workload_names(&self, fetch: &WorkloadFetch) -> Result<Vec<String>> {
        let listing = with_retry(&fetch.policy, "list_workloads", || {
            fetch.count_call();
            self.workloads.fetch_workload(&fetch.gvc, None)
        })
        .await?;
        parse_workload_names(&listing)
    }

    async fn fetch_sequential(
        &self,
        fetch: &WorkloadFetch,
        workloads: Vec<String>,
        options: &AdvancedListingOptions,
    ) -> Vec<(String, Result<Vec<Container>>)> {
        let total = workloads.len();
        let mut outcomes = Vec::with_capacity(total);
        for (index, workload) in workloads.into_iter().enumerate() {
            debug!(gvc = %fetch.gvc, workload = %workload, "Fetching workload containers");
            let outcome = fetch.containers(&workload).await;
            options.notify_progress(&workload, index + 1, total);
            outcomes.push((workload, outcome));
        }
        outcomes
    }

    async fn fetch_parallel(
        &self,
        fetch: &WorkloadFetch,
        workloads: Vec<String>,
        options: &AdvancedListingOptions,
    ) -> Vec<(String, Result<Vec<Container>>)> {
        let worker_fetch = fetch.clone();
        run_bounded(
            workloads,
            options.worker_count(),
            move |workload: String| {
                let fetch = worker_fetch.clone();
                async move {
                    debug!(gvc = %fetch.gvc, workload = %workload, "Fetching workload containers");
                    let outcome = fetch.containers(&workload).await;
                    (workload, outcome)
                }
            },
            |(workload, _): &(String, Result<Vec<Container>>), completed, total| {
                options.notify_progress(workload, completed, total)
            },
        )
        .await
    }

    fn finish(
        &self,
        stats: &mut ContainerListingStatistics,
        containers: &[Container],
        api_calls: &AtomicUsize,
        started: Instant,
        options: &AdvancedListingOptions,
    ) {
        let calls = api_calls.load(Ordering::Relaxed);
        stats.record_api_calls(calls);
        self.metrics.add_api_calls(calls as u64);
        stats.finalize(containers, options.collect_statistics);
        self.metrics
            .observe_listing_latency(started.elapsed().as_secs_f64());
    }

    /// Number of containers `list_advanced` returns for the same arguments.
    ///
    /// This performs the full listing (subject to the cache); it is a
    /// convenience, not a cheaper query.
    pub async fn count_containers(
        &self,
        gvc: &str,
        workload_name: Option<&str>,
        location: Option<&str>,
        options: &AdvancedListingOptions,
    ) -> Result<usize> {
        let (containers, _) = self
            .list_advanced(gvc, workload_name, location, options)
            .await?;
        Ok(containers.len())
    }

    /// Re-derive live status for each container in place.
    ///
    /// One container failing to refresh never stops the batch; the failure
    /// is counted and the container keeps its previous status.
    pub async fn refresh_all_status(
        &self,
        containers: &mut Vec<Container>,
        options: &AdvancedListingOptions,
    ) -> RefreshSummary {
        let mut summary = RefreshSummary::default();
        let total = containers.len();

        if !options.enable_parallel || total <= 1 {
            for (index, container) in containers.iter_mut().enumerate() {
                let outcome = container.refresh_status(self.deployments.as_ref()).await;
                tally(&mut summary, container, outcome);
                options.notify_progress(&container.name, index + 1, total);
            }
            return summary;
        }

        let deployments = self.deployments.clone();
        // Workers own their container; a worker that dies takes it along
        let snapshot = containers.clone();
        let indexed: Vec<(usize, Container)> = std::mem::take(containers).into_iter().enumerate().collect();
        let mut refreshed = run_bounded(
            indexed,
            options.worker_count(),
            move |(index, mut container): (usize, Container)| {
                let deployments = deployments.clone();
                async move {
                    let outcome = container.refresh_status(deployments.as_ref()).await;
                    (index, container, outcome)
                }
            },
            |(_, container, _): &(usize, Container, Result<()>), completed, total| {
                options.notify_progress(&container.name, completed, total)
            },
        )
        .await;

        refreshed.sort_by_key(|(index, _, _)| *index);
        let mut refreshed = refreshed.into_iter().peekable();
        containers.reserve(snapshot.len());
        for (index, original) in snapshot.into_iter().enumerate() {
            match refreshed.next_if(|(i, _, _)| *i == index) {
                Some((_, container, outcome)) => {
                    tally(&mut summary, &container, outcome);
                    containers.push(container);
                }
                None => {
                    let lost = Err(Error::Task("status refresh did not complete".to_string()));
                    tally(&mut summary, &original, lost);
                    containers.push(original);
                }
            }
        }
        summary
    }

    /// List containers and, when `refresh_status` is set, refresh their
    /// live status before returning.
    ///
    /// Refresh failures are appended to the statistics errors.
    pub async fn get_containers_with_status(
        &self,
        gvc: &str,
        workload_name: Option<&str>,
        location: Option<&str>,
        options: &AdvancedListingOptions,
        refresh_status: bool,
    ) -> Result<(Vec<Container>, ContainerListingStatistics)> {
        let (mut containers, mut stats) = self
            .list_advanced(gvc, workload_name, location, options)
            .await?;

        if refresh_status && !containers.is_empty() {
            let summary = self.refresh_all_status(&mut containers, options).await;
            info!(
                gvc = %gvc,
                successful = summary.successful,
                failed = summary.failed,
                "Refreshed container status"
            );
            if summary.failed > 0 {
                stats.record_error(format!(
                    "Failed to refresh status for {} of {} containers",
                    summary.failed,
                    summary.total()
                ));
            }
        }

        Ok((containers, stats))
    }

    /// Drop every cached listing
    pub fn clear_cache(&self) {
        let entries = self.cache.size();
        self.cache.clear();
        self.logger.log_cache_cleared(entries);
    }

    /// Number of live cache entries (sweeps expired entries first)
    pub fn get_cache_size(&self) -> usize {
        self.cache.size()
    }
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(format!("{field} is required")));
    }
    Ok(())
}

fn tally(summary: &mut RefreshSummary, container: &Container, outcome: Result<()>) {
    match outcome {
        Ok(()) => summary.successful += 1,
        Err(e) => {
            warn!(
                container = %container.name,
                workload = %container.workload_name,
                location = %container.location,
                error = %e,
                "Failed to refresh container status"
            );
            summary.failed += 1;
        }
    }
}

/// Health filter, system-container filter, then prefix pagination
fn apply_filters(
    mut containers: Vec<Container>,
    options: &AdvancedListingOptions,
) -> Vec<Container> {
    if options.filter_unhealthy {
        containers.retain(Container::is_healthy);
    }
    if !options.include_system_containers {
        containers.retain(|c| !is_system_container(&c.name));
    }
    if let Some(limit) = options.result_limit() {
        containers.truncate(limit);
    }
    containers
}
