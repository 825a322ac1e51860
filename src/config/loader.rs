/// Configuration loading from TOML file
use std::path::Path;
use crate::error::{Result, SearchError};
use crate::types::Config;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| SearchError::ConfigError(format!("Failed to read config file: {}", e)))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| SearchError::ConfigError(format!("Failed to parse config: {}", e)))?;

    // Validate config
    validate_config(&config)?;

    Ok(config)
}

fn validate_config(config: &Config) -> Result<()> {
    if config.listen_addr.is_empty() {
        return Err(SearchError::ConfigError("listen_addr is empty".to_string()));
    }

    if config.instrument_file.is_empty() {
        return Err(SearchError::ConfigError("instrument_file is empty".to_string()));
    }

    // Validate resolution thresholds
    if config.fuzzy_score_threshold <= 0.0 || config.fuzzy_score_threshold > 100.0 {
        return Err(SearchError::ConfigError(
            format!("Invalid fuzzy_score_threshold: {}", config.fuzzy_score_threshold)
        ));
    }

    // Validate strike heuristics
    if config.strike_scale_multiplier <= 1.0 {
        return Err(SearchError::ConfigError(
            format!("Invalid strike_scale_multiplier: {}", config.strike_scale_multiplier)
        ));
    }

    if config.strike_range_pct <= 0.0 || config.strike_range_pct >= 1.0 {
        return Err(SearchError::ConfigError(
            format!("Invalid strike_range_pct: {}", config.strike_range_pct)
        ));
    }

    // Validate result shaping
    if config.result_limit == 0 || config.futures_limit == 0 || config.prefix_limit == 0 {
        return Err(SearchError::ConfigError(
            "Result limits must be >= 1".to_string()
        ));
    }

    if config.store_query_cap < config.result_limit {
        return Err(SearchError::ConfigError(
            "store_query_cap must be >= result_limit".to_string()
        ));
    }

    Ok(())
}
