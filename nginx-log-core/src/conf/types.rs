use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level engine configuration, usually loaded from `nginx-log.hcl`.
///
/// Every section is optional; a missing section falls back to its defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub queue: QueueConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    #[serde(default)]
    pub circuit_breaker: CircuitBreakerConfig,

    /// Directory prefixes log files must live under. Empty allows every path.
    #[serde(default)]
    pub whitelist: Vec<PathBuf>,

    #[serde(default)]
    pub enrichment: EnrichmentConfig,
}

//-----------------------------------------------------------------------------
// Index
//-----------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IndexConfig {
    /// Directory holding one tantivy index per shard. `None` keeps the index in memory only.
    #[serde(default = "index_default_data_dir")]
    pub data_dir: Option<PathBuf>,

    #[serde(default = "index_default_shard_count")]
    pub shard_count: usize,

    /// Operations per index batch before it is flushed.
    #[serde(default = "index_default_batch_size")]
    pub batch_size: usize,

    /// Lines accumulated by the file scanner before a parse pass.
    #[serde(default = "index_default_scan_buffer_lines")]
    pub scan_buffer_lines: usize,

    #[serde(default = "index_default_progress_every_lines")]
    pub progress_every_lines: u64,

    #[serde(default = "index_default_max_file_size_bytes")]
    pub max_file_size_bytes: u64,

    /// Files indexed concurrently by the task queue.
    #[serde(default = "index_default_worker_pool_size")]
    pub worker_pool_size: usize,

    /// Where the per-file cursors are persisted. `None` keeps them in memory.
    #[serde(default)]
    pub cursor_file: Option<PathBuf>,
}

fn index_default_data_dir() -> Option<PathBuf> {
    Some(PathBuf::from("./data/index"))
}
fn index_default_shard_count() -> usize {
    4
}
fn index_default_batch_size() -> usize {
    1000
}
fn index_default_scan_buffer_lines() -> usize {
    10_000
}
fn index_default_progress_every_lines() -> u64 {
    5_000
}
fn index_default_max_file_size_bytes() -> u64 {
    10 * 1024 * 1024 * 1024
}
fn index_default_worker_pool_size() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            data_dir: index_default_data_dir(),
            shard_count: index_default_shard_count(),
            batch_size: index_default_batch_size(),
            scan_buffer_lines: index_default_scan_buffer_lines(),
            progress_every_lines: index_default_progress_every_lines(),
            max_file_size_bytes: index_default_max_file_size_bytes(),
            worker_pool_size: index_default_worker_pool_size(),
            cursor_file: None,
        }
    }
}

//-----------------------------------------------------------------------------
// Task queue
//-----------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QueueConfig {
    #[serde(default = "queue_default_capacity")]
    pub capacity: usize,

    /// Quiet period a file must observe before a debounced task runs.
    #[serde(default = "queue_default_debounce_secs")]
    pub debounce_secs: u64,

    /// Minimum time between two successful incremental runs of the same file.
    #[serde(default = "queue_default_min_reindex_interval_secs")]
    pub min_reindex_interval_secs: u64,

    #[serde(default = "queue_default_submit_timeout_ms")]
    pub submit_timeout_ms: u64,

    #[serde(default = "queue_default_response_timeout_ms")]
    pub response_timeout_ms: u64,
}

fn queue_default_capacity() -> usize {
    1000
}
fn queue_default_debounce_secs() -> u64 {
    30
}
fn queue_default_min_reindex_interval_secs() -> u64 {
    30
}
fn queue_default_submit_timeout_ms() -> u64 {
    30_000
}
fn queue_default_response_timeout_ms() -> u64 {
    30_000
}

impl QueueConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_secs(self.debounce_secs)
    }

    pub fn min_reindex_interval(&self) -> Duration {
        Duration::from_secs(self.min_reindex_interval_secs)
    }

    pub fn submit_timeout(&self) -> Duration {
        Duration::from_millis(self.submit_timeout_ms)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: queue_default_capacity(),
            debounce_secs: queue_default_debounce_secs(),
            min_reindex_interval_secs: queue_default_min_reindex_interval_secs(),
            submit_timeout_ms: queue_default_submit_timeout_ms(),
            response_timeout_ms: queue_default_response_timeout_ms(),
        }
    }
}

//-----------------------------------------------------------------------------
// Search
//-----------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    /// Page size used when a request does not set `limit`.
    #[serde(default = "search_default_default_limit")]
    pub default_limit: usize,

    /// Hard ceiling for `limit` ("unlimited" requests clamp here).
    #[serde(default = "search_default_max_limit")]
    pub max_limit: usize,

    /// Time filters spanning this many days or more are dropped.
    #[serde(default = "search_default_max_time_range_days")]
    pub max_time_range_days: i64,

    #[serde(default = "search_default_result_cache_max_cost")]
    pub result_cache_max_cost: u64,

    #[serde(default = "search_default_summary_cache_capacity")]
    pub summary_cache_capacity: usize,

    #[serde(default = "search_default_summary_ttl_secs")]
    pub summary_ttl_secs: u64,

    /// Documents fetched per page by summary and analytics scans.
    #[serde(default = "search_default_page_size")]
    pub page_size: usize,

    /// Corpus size above which dashboards use the paged aggregation path.
    #[serde(default = "search_default_aggregation_threshold")]
    pub aggregation_threshold: u64,

    #[serde(default = "search_default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn search_default_default_limit() -> usize {
    50_000
}
fn search_default_max_limit() -> usize {
    10_000_000
}
fn search_default_max_time_range_days() -> i64 {
    400
}
fn search_default_result_cache_max_cost() -> u64 {
    256 * 1024 * 1024
}
fn search_default_summary_cache_capacity() -> usize {
    1024
}
fn search_default_summary_ttl_secs() -> u64 {
    300
}
fn search_default_page_size() -> usize {
    10_000
}
fn search_default_aggregation_threshold() -> u64 {
    100_000
}
fn search_default_request_timeout_ms() -> u64 {
    30_000
}

impl SearchConfig {
    pub fn summary_ttl(&self) -> Duration {
        Duration::from_secs(self.summary_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: search_default_default_limit(),
            max_limit: search_default_max_limit(),
            max_time_range_days: search_default_max_time_range_days(),
            result_cache_max_cost: search_default_result_cache_max_cost(),
            summary_cache_capacity: search_default_summary_cache_capacity(),
            summary_ttl_secs: search_default_summary_ttl_secs(),
            page_size: search_default_page_size(),
            aggregation_threshold: search_default_aggregation_threshold(),
            request_timeout_ms: search_default_request_timeout_ms(),
        }
    }
}

//-----------------------------------------------------------------------------
// Search guards
//-----------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "rl_default_requests_per_second")]
    pub requests_per_second: f64,

    #[serde(default = "rl_default_burst")]
    pub burst: u32,
}

fn rl_default_requests_per_second() -> f64 {
    100.0
}
fn rl_default_burst() -> u32 {
    200
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            requests_per_second: rl_default_requests_per_second(),
            burst: rl_default_burst(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CircuitBreakerConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Failures in the "closed" state before opening the circuit.
    #[serde(default = "cb_default_failure_threshold")]
    pub failure_threshold: u32,

    /// How long to keep the circuit open before allowing probes.
    #[serde(default = "cb_default_open_duration_ms")]
    pub open_duration_ms: u64,

    /// How many simultaneous probe requests are allowed in half-open.
    #[serde(default = "cb_default_half_open_max_requests")]
    pub half_open_max_requests: u32,

    /// How many successful probes close the circuit again.
    #[serde(default = "cb_default_success_threshold")]
    pub success_threshold: u32,
}

fn cb_default_failure_threshold() -> u32 {
    5
}
fn cb_default_open_duration_ms() -> u64 {
    10_000
}
fn cb_default_half_open_max_requests() -> u32 {
    1
}
fn cb_default_success_threshold() -> u32 {
    2
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            failure_threshold: cb_default_failure_threshold(),
            open_duration_ms: cb_default_open_duration_ms(),
            half_open_max_requests: cb_default_half_open_max_requests(),
            success_threshold: cb_default_success_threshold(),
        }
    }
}

//-----------------------------------------------------------------------------
// Enrichment
//-----------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EnrichmentConfig {
    #[serde(default = "enrichment_default_enable_user_agent")]
    pub enable_user_agent: bool,

    #[serde(default = "default_ua_engine")]
    pub ua_engine: UaEngineKind,

    #[serde(default)]
    pub enable_geoip: bool,

    /// MaxMind City database.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geoip_db: Option<PathBuf>,
}

fn enrichment_default_enable_user_agent() -> bool {
    true
}

fn default_ua_engine() -> UaEngineKind {
    UaEngineKind::Regex
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            enable_user_agent: enrichment_default_enable_user_agent(),
            ua_engine: default_ua_engine(),
            enable_geoip: false,
            geoip_db: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UaEngineKind {
    Regex,
    Woothee,
}
