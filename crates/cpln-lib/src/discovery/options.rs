//! Listing options for [`ContainerCollection::list_advanced`](super::ContainerCollection::list_advanced)

use super::retry::RetryPolicy;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Progress hook: `(item, completed, total)`.
///
/// `item` names what just finished: the workload while listing, the
/// container while refreshing status. Invoked in completion order, so
/// under parallel mode `completed` grows monotonically but the names
/// arrive out of listing order.
pub type ProgressCallback = Arc<dyn Fn(&str, usize, usize) + Send + Sync>;

/// Toggles for parallelism, caching, pagination, retry and filtering
#[derive(Clone)]
pub struct AdvancedListingOptions {
    pub enable_parallel: bool,
    pub max_workers: usize,

    pub enable_cache: bool,
    pub cache_ttl_seconds: u64,

    pub enable_pagination: bool,
    pub page_size: usize,
    /// Prefix length kept when pagination is enabled; `page_size` if unset
    pub max_results: Option<usize>,

    pub enable_retry: bool,
    pub max_retries: u32,
    pub retry_delay_seconds: f64,
    pub retry_backoff_factor: f64,

    pub progress_callback: Option<ProgressCallback>,
    pub filter_unhealthy: bool,
    pub include_system_containers: bool,
    pub collect_statistics: bool,
}

impl Default for AdvancedListingOptions {
    fn default() -> Self {
        Self {
            enable_parallel: true,
            max_workers: 5,
            enable_cache: true,
            cache_ttl_seconds: 300,
            enable_pagination: false,
            page_size: 100,
            max_results: None,
            enable_retry: true,
            max_retries: 3,
            retry_delay_seconds: 1.0,
            retry_backoff_factor: 2.0,
            progress_callback: None,
            filter_unhealthy: false,
            include_system_containers: false,
            collect_statistics: true,
        }
    }
}

impl fmt::Debug for AdvancedListingOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdvancedListingOptions")
            .field("enable_parallel", &self.enable_parallel)
            .field("max_workers", &self.max_workers)
            .field("enable_cache", &self.enable_cache)
            .field("cache_ttl_seconds", &self.cache_ttl_seconds)
            .field("enable_pagination", &self.enable_pagination)
            .field("page_size", &self.page_size)
            .field("max_results", &self.max_results)
            .field("enable_retry", &self.enable_retry)
            .field("max_retries", &self.max_retries)
            .field("retry_delay_seconds", &self.retry_delay_seconds)
            .field("retry_backoff_factor", &self.retry_backoff_factor)
            .field("progress_callback", &self.progress_callback.is_some())
            .field("filter_unhealthy", &self.filter_unhealthy)
            .field("include_system_containers", &self.include_system_containers)
            .field("collect_statistics", &self.collect_statistics)
            .finish()
    }
}

impl AdvancedListingOptions {
    pub fn builder() -> AdvancedListingOptionsBuilder {
        AdvancedListingOptionsBuilder::new()
    }

    /// Retry policy in effect; a single attempt when retry is disabled
    pub fn retry_policy(&self) -> RetryPolicy {
        if !self.enable_retry {
            return RetryPolicy::disabled();
        }
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::try_from_secs_f64(self.retry_delay_seconds)
                .unwrap_or(Duration::ZERO),
            backoff_factor: self.retry_backoff_factor,
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    /// Worker count used for fan-out; never zero
    pub fn worker_count(&self) -> usize {
        if self.enable_parallel {
            self.max_workers.max(1)
        } else {
            1
        }
    }

    /// Number of leading results kept when pagination is enabled
    pub fn result_limit(&self) -> Option<usize> {
        self.enable_pagination
            .then(|| self.max_results.unwrap_or(self.page_size))
    }

    pub(crate) fn notify_progress(&self, workload: &str, completed: usize, total: usize) {
        if let Some(callback) = &self.progress_callback {
            callback(workload, completed, total);
        }
    }
}

/// Builder for [`AdvancedListingOptions`]
#[derive(Debug, Clone, Default)]
pub struct AdvancedListingOptionsBuilder {
    options: AdvancedListingOptions,
}

impl AdvancedListingOptionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parallel(mut self, enabled: bool) -> Self {
        self.options.enable_parallel = enabled;
        self
    }

    pub fn max_workers(mut self, workers: usize) -> Self {
        self.options.max_workers = workers;
        self
    }

    pub fn cache(mut self, enabled: bool) -> Self {
        self.options.enable_cache = enabled;
        self
    }

    pub fn cache_ttl_seconds(mut self, seconds: u64) -> Self {
        self.options.cache_ttl_seconds = seconds;
        self
    }

    pub fn pagination(mut self, enabled: bool) -> Self {
        self.options.enable_pagination = enabled;
        self
    }

    pub fn page_size(mut self, size: usize) -> Self {
        self.options.page_size = size;
        self
    }

    pub fn max_results(mut self, max: usize) -> Self {
        self.options.max_results = Some(max);
        self
    }

    pub fn retry(mut self, enabled: bool) -> Self {
        self.options.enable_retry = enabled;
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.options.max_retries = retries;
        self
    }

    pub fn retry_delay_seconds(mut self, seconds: f64) -> Self {
        self.options.retry_delay_seconds = seconds;
        self
    }

    pub fn retry_backoff_factor(mut self, factor: f64) -> Self {
        self.options.retry_backoff_factor = factor;
        self
    }

    pub fn progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.options.progress_callback = Some(callback);
        self
    }

    pub fn filter_unhealthy(mut self, enabled: bool) -> Self {
        self.options.filter_unhealthy = enabled;
        self
    }

    pub fn include_system_containers(mut self, enabled: bool) -> Self {
        self.options.include_system_containers = enabled;
        self
    }

    pub fn collect_statistics(mut self, enabled: bool) -> Self {
        self.options.collect_statistics = enabled;
        self
    }

    pub fn build(self) -> AdvancedListingOptions {
        self.options
    }
}
