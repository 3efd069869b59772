use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let database_url = lookup("DATABASE_URL")
        .ok()
        .filter(|url| !url.trim().is_empty());

    let log_level = or_default("GROCY_LOG_LEVEL", "info");
    let keywords_path = PathBuf::from(or_default("GROCY_KEYWORDS_PATH", "./config/keywords.txt"));

    let reference_source = or_default("GROCY_REFERENCE_SOURCE", "Rimi");
    if reference_source.trim().is_empty() {
        return Err(invalid(
            "GROCY_REFERENCE_SOURCE",
            "must be non-empty".to_string(),
        ));
    }

    let fuzzy_limit = parse_usize("GROCY_FUZZY_LIMIT", "10")?;
    if fuzzy_limit == 0 {
        return Err(invalid("GROCY_FUZZY_LIMIT", "must be at least 1".to_string()));
    }

    let fuzzy_score_cutoff = or_default("GROCY_FUZZY_SCORE_CUTOFF", "30")
        .parse::<f64>()
        .map_err(|e| invalid("GROCY_FUZZY_SCORE_CUTOFF", e.to_string()))?;
    if !(0.0..=100.0).contains(&fuzzy_score_cutoff) {
        return Err(invalid(
            "GROCY_FUZZY_SCORE_CUTOFF",
            format!("{fuzzy_score_cutoff} is outside 0..=100"),
        ));
    }

    let max_concurrent_feeds = parse_usize("GROCY_MAX_CONCURRENT_FEEDS", "4")?;

    let db_max_connections = parse_u32("GROCY_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("GROCY_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("GROCY_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    Ok(AppConfig {
        database_url,
        log_level,
        keywords_path,
        reference_source,
        fuzzy_limit,
        fuzzy_score_cutoff,
        max_concurrent_feeds,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
