//! Source-shaped product cards, one JSON object per feed line.
//!
//! The page-fetching collaborator dumps each product tile it finds as a
//! JSON object. The shapes differ per retailer:
//!
//! ### Maxima
//! The cart payload embedded on each tile. `id` and `price` are sometimes
//! JSON numbers and sometimes strings, so both are accepted. `price` is a
//! single string with a decimal comma (`"1,29"`). The per-unit price is
//! split into `comparative_unit_price` (`"2,58"`) and `comparative_unit`
//! (`"kg"`). `status` is `"active"` or `"out_of_stock"`.
//!
//! ### Rimi
//! The price tag renders euros and cents in separate elements, captured as
//! `price_euros` + `price_cents`. The old price and the per-unit price are
//! full strings (`"1,59 €"`, `"2,58 €/kg"`). Rimi is the only source that
//! puts a category on the card.

use serde::{Deserialize, Deserializer};

#[derive(Debug, Default, Deserialize)]
pub struct MaximaCard {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub price: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub old_price: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub comparative_unit_price: Option<String>,
    #[serde(default)]
    pub comparative_unit: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    /// e.g. `"Akcija spēkā līdz 20.10."`
    #[serde(default)]
    pub promotion_text: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RimiCard {
    #[serde(default, deserialize_with = "string_or_number")]
    pub product_code: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub price_euros: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub price_cents: Option<String>,
    #[serde(default)]
    pub old_price: Option<String>,
    #[serde(default)]
    pub price_per_unit: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub in_stock: Option<bool>,
    #[serde(default)]
    pub promo_valid: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Accepts a JSON string or number and yields it as a string. `null` and
/// empty strings become `None`.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
