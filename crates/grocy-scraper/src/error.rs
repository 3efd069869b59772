use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("failed to read feed {path}: {source}")]
    FeedIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no extractor registered for source \"{0}\"")]
    UnknownSource(String),
}

/// A single field that could not be parsed.
///
/// Field-local: the normalizer substitutes a default and keeps building the
/// record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedField {
    #[error("unparseable price text \"{0}\"")]
    Price(String),

    #[error("unparseable unit price annotation \"{0}\"")]
    UnitPrice(String),

    #[error("unparseable validity interval \"{0}\"")]
    Deadline(String),
}
