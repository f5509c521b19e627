use crate::conf::error::ConfigError;
use crate::conf::types::EngineConfig;

/// Reject configurations the engine cannot run with. All violations are
/// reported at once rather than stopping at the first one.
pub fn validate(cfg: &EngineConfig) -> Result<(), ConfigError> {
    let mut violations = Vec::new();

    if cfg.index.shard_count == 0 {
        violations.push("index.shard_count must be at least 1".to_string());
    }
    if cfg.index.batch_size == 0 {
        violations.push("index.batch_size must be at least 1".to_string());
    }
    if cfg.index.scan_buffer_lines == 0 {
        violations.push("index.scan_buffer_lines must be at least 1".to_string());
    }
    if cfg.index.worker_pool_size == 0 {
        violations.push("index.worker_pool_size must be at least 1".to_string());
    }
    if cfg.queue.capacity == 0 {
        violations.push("queue.capacity must be at least 1".to_string());
    }
    if cfg.search.default_limit > cfg.search.max_limit {
        violations.push(format!(
            "search.default_limit ({}) exceeds search.max_limit ({})",
            cfg.search.default_limit, cfg.search.max_limit
        ));
    }
    if cfg.search.page_size == 0 {
        violations.push("search.page_size must be at least 1".to_string());
    }
    if cfg.search.max_time_range_days <= 0 {
        violations.push("search.max_time_range_days must be positive".to_string());
    }
    if cfg.rate_limit.enabled && cfg.rate_limit.requests_per_second <= 0.0 {
        violations.push("rate_limit.requests_per_second must be positive".to_string());
    }
    if cfg.rate_limit.enabled && cfg.rate_limit.burst == 0 {
        violations.push("rate_limit.burst must be at least 1".to_string());
    }
    if cfg.circuit_breaker.enabled && cfg.circuit_breaker.failure_threshold == 0 {
        violations.push("circuit_breaker.failure_threshold must be at least 1".to_string());
    }
    if cfg.enrichment.enable_geoip && cfg.enrichment.geoip_db.is_none() {
        violations.push("enrichment.geoip_db is required when enable_geoip is set".to_string());
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Invalid { violations })
    }
}
