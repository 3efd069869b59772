use std::path::PathBuf;

use crate::ConfigError;

#[derive(Clone)]
pub struct AppConfig {
    /// Only the commands that touch Postgres need it; see
    /// [`AppConfig::require_database_url`].
    pub database_url: Option<String>,
    pub log_level: String,
    pub keywords_path: PathBuf,
    /// Source whose categorized records vote in the fuzzy category fallback.
    pub reference_source: String,
    pub fuzzy_limit: usize,
    pub fuzzy_score_cutoff: f64,
    pub max_concurrent_feeds: usize,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("log_level", &self.log_level)
            .field("keywords_path", &self.keywords_path)
            .field("database_url", &"[redacted]")
            .field("reference_source", &self.reference_source)
            .field("fuzzy_limit", &self.fuzzy_limit)
            .field("fuzzy_score_cutoff", &self.fuzzy_score_cutoff)
            .field("max_concurrent_feeds", &self.max_concurrent_feeds)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .finish()
    }
}

impl AppConfig {
    /// The database URL, for commands that connect.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] when `DATABASE_URL` was not set.
    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))
    }
}
