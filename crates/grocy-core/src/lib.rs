pub mod app_config;
pub mod config;
pub mod keywords;
pub mod records;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use keywords::{load_keyword_table, parse_keyword_table, KeywordRule, KeywordTable};
pub use records::{
    CatalogRecord, Identity, PriceInfo, PriceText, RawScrapedFields, TimeInfo, Unit,
    CURRENCY_EUR,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid unit: {0}")]
    InvalidUnit(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read keyword table at {path}: {source}")]
    KeywordFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("keyword table line {line}: {reason}")]
    KeywordLine { line: usize, reason: String },
}
