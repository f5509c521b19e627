use crate::conf::error::ConfigError;
use crate::conf::types::EngineConfig;
use crate::conf::validation::validate;
use std::fs;
use std::path::Path;

/// Read, parse, and validate an HCL configuration file.
pub fn load_config(path: &Path) -> Result<EngineConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
    let cfg = parse_config(path, &raw)?;

    validate(&cfg)?;

    tracing::debug!(
        path = %path.display(),
        shards = cfg.index.shard_count,
        whitelist = cfg.whitelist.len(),
        "configuration loaded"
    );

    Ok(cfg)
}

/// Parse HCL source without validating it. `path` is only used for error messages.
pub fn parse_config(path: &Path, source: &str) -> Result<EngineConfig, ConfigError> {
    hcl::from_str(source).map_err(|e| ConfigError::parse(path, e))
}
