use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Every price in the catalog is denominated in euro.
pub const CURRENCY_EUR: &str = "EUR";

/// Cross-run identity of a catalog record: the source name plus the
/// source-native product code. The code is opaque and never transformed
/// beyond trimming.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub source: String,
    pub product_code: String,
}

impl Identity {
    #[must_use]
    pub fn new(source: impl Into<String>, product_code: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            product_code: product_code.into(),
        }
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.source, self.product_code)
    }
}

/// Unit of a record's `quantity`.
///
/// Mass and volume are only ever persisted as grams and millilitres; `kg`
/// and `l` are converted by the normalizer and rejected by
/// [`Unit::parse_canonical`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Unit {
    Grams,
    Millilitres,
    /// Count-like or source-specific units such as `gab.` (pieces).
    Other(String),
}

impl Unit {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Unit::Grams => "g",
            Unit::Millilitres => "ml",
            Unit::Other(s) => s,
        }
    }

    /// `true` for `g` and `ml`, whose per-unit price is quoted per 1000 units.
    #[must_use]
    pub fn is_mass_or_volume(&self) -> bool {
        matches!(self, Unit::Grams | Unit::Millilitres)
    }

    /// Parses a stored unit string.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidUnit`] for `kg`, `l` or an empty string.
    pub fn parse_canonical(raw: &str) -> Result<Self, CoreError> {
        match raw.trim() {
            "g" => Ok(Unit::Grams),
            "ml" => Ok(Unit::Millilitres),
            "" | "kg" | "l" => Err(CoreError::InvalidUnit(raw.to_string())),
            other => Ok(Unit::Other(other.to_string())),
        }
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Unit {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Unit::parse_canonical(&value)
    }
}

impl From<Unit> for String {
    fn from(unit: Unit) -> Self {
        unit.as_str().to_string()
    }
}

/// The nested price group of a [`CatalogRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceInfo {
    pub value: f64,
    /// Pre-discount price; equals `value` when no discount is shown.
    pub old_value: f64,
    /// Whole percent, `0` when there is no discount.
    pub discount: u32,
    pub currency: String,
    /// Price per 1000 units for `g`/`ml`, per single unit otherwise.
    pub price_per_unit: f64,
}

/// The nested time group of a [`CatalogRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeInfo {
    /// Set on first insert and never overwritten.
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub discount_deadline: Option<DateTime<Utc>>,
}

/// One product as the catalog stores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub identity: Identity,
    pub name: String,
    pub search_name: String,
    pub brand: String,
    pub category: Option<String>,
    /// Denormalized copy of `identity.source`.
    pub store: String,
    pub stock: bool,
    pub unit: Option<Unit>,
    pub quantity: Option<f64>,
    pub price: PriceInfo,
    pub time: TimeInfo,
    pub image_url: Option<String>,
}

/// A price as the source page renders it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceText {
    /// Separate integer and fraction elements, e.g. `"12"` + `"99"`.
    Split { whole: String, fraction: String },
    /// A single string such as `"1,59 €"`.
    Single(String),
}

/// Fields pulled from one product card by a source extractor.
///
/// Ephemeral: consumed once by the reconciler and never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawScrapedFields {
    pub source: String,
    pub product_code: Option<String>,
    pub title: Option<String>,
    pub price_text: Option<PriceText>,
    pub old_price_text: Option<PriceText>,
    /// Per-unit price annotation, e.g. `"2,58 €/kg"`.
    pub unit_price_text: Option<String>,
    /// Size fragment rendered apart from the title, e.g. `"500 g"`.
    pub quantity_text: Option<String>,
    pub in_stock: Option<bool>,
    /// Promotion validity interval, e.g. `"14.10.2026 - 20.10.2026"`.
    pub validity_text: Option<String>,
    /// Only some sources expose a category on the card.
    pub category: Option<String>,
    pub image_url: Option<String>,
}
