//! Per-source extraction from card JSON into [`RawScrapedFields`].
//!
//! Every retailer gets its own [`RawFieldsExtractor`] so that source format
//! differences stop here and the normalizer only ever sees one shape.

use grocy_core::{PriceText, RawScrapedFields};

use crate::error::ScraperError;
use crate::types::{MaximaCard, RimiCard};

pub trait RawFieldsExtractor: Send + Sync {
    /// Source name stamped on every record, e.g. `"Maxima"`.
    fn source(&self) -> &'static str;

    /// Decodes one feed line into the common raw shape.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Deserialize`] when the line is not a valid card.
    fn extract(&self, line: &str) -> Result<RawScrapedFields, ScraperError>;
}

pub struct MaximaExtractor;

impl RawFieldsExtractor for MaximaExtractor {
    fn source(&self) -> &'static str {
        "Maxima"
    }

    fn extract(&self, line: &str) -> Result<RawScrapedFields, ScraperError> {
        let card: MaximaCard =
            serde_json::from_str(line).map_err(|source| ScraperError::Deserialize {
                context: "maxima card".to_string(),
                source,
            })?;

        let unit_price_text = match (card.comparative_unit_price, card.comparative_unit) {
            (Some(price), Some(unit)) if !unit.trim().is_empty() => {
                Some(format!("{} €/{}", price.trim(), unit.trim()))
            }
            _ => None,
        };

        Ok(RawScrapedFields {
            source: self.source().to_string(),
            product_code: card.id,
            title: card.title,
            price_text: card.price.map(PriceText::Single),
            old_price_text: card.old_price.map(PriceText::Single),
            unit_price_text,
            quantity_text: None,
            in_stock: card.status.map(|s| s.trim() != "out_of_stock"),
            validity_text: card.promotion_text,
            category: None,
            image_url: non_empty(card.image),
        })
    }
}

pub struct RimiExtractor;

impl RawFieldsExtractor for RimiExtractor {
    fn source(&self) -> &'static str {
        "Rimi"
    }

    fn extract(&self, line: &str) -> Result<RawScrapedFields, ScraperError> {
        let card: RimiCard =
            serde_json::from_str(line).map_err(|source| ScraperError::Deserialize {
                context: "rimi card".to_string(),
                source,
            })?;

        let price_text = card.price_euros.map(|whole| PriceText::Split {
            whole,
            fraction: card.price_cents.unwrap_or_default(),
        });

        Ok(RawScrapedFields {
            source: self.source().to_string(),
            product_code: card.product_code,
            title: card.name,
            price_text,
            old_price_text: non_empty(card.old_price).map(PriceText::Single),
            unit_price_text: non_empty(card.price_per_unit),
            quantity_text: None,
            in_stock: card.in_stock,
            validity_text: non_empty(card.promo_valid),
            category: non_empty(card.category),
            image_url: non_empty(card.image_url),
        })
    }
}

/// Looks up the extractor for a source name (case-insensitive).
///
/// # Errors
///
/// Returns [`ScraperError::UnknownSource`] for an unsupported source.
pub fn extractor_for(source: &str) -> Result<Box<dyn RawFieldsExtractor>, ScraperError> {
    match source.trim().to_lowercase().as_str() {
        "maxima" => Ok(Box::new(MaximaExtractor)),
        "rimi" => Ok(Box::new(RimiExtractor)),
        _ => Err(ScraperError::UnknownSource(source.to_string())),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
