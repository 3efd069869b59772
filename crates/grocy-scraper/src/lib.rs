pub mod error;
pub mod extract;
pub mod feed;
pub mod normalize;
pub mod parse;
pub mod types;

pub use error::{MalformedField, ScraperError};
pub use extract::{extractor_for, MaximaExtractor, RawFieldsExtractor, RimiExtractor};
pub use feed::{FeedReader, FeedRecords};
pub use normalize::{normalize_fields, NormalizedFields};
pub use types::{MaximaCard, RimiCard};
