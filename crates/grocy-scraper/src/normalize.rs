//! Normalization from [`RawScrapedFields`] to canonical catalog values.
//!
//! Text parsing is delegated to [`crate::parse`]; this module decides
//! precedence, conversions and defaults. Nothing here fails: a malformed
//! field is logged, recorded in [`NormalizedFields::diagnostics`] and
//! replaced with its default.

use chrono::{DateTime, NaiveDate, Utc};
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

use grocy_core::{RawScrapedFields, Unit};

use crate::error::MalformedField;
use crate::parse::{
    find_quantity_token, parse_deadline, parse_price_text, parse_unit_price, round2,
};

/// Discounts are whole percents in this range.
const MAX_DISCOUNT: f64 = 99.0;

/// The canonical values derived from one raw record.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedFields {
    /// Trimmed title; `None` when missing or blank.
    pub title: Option<String>,
    pub search_name: String,
    pub brand: String,
    pub price: f64,
    pub old_price: f64,
    pub discount: u32,
    pub quantity: Option<f64>,
    pub unit: Option<Unit>,
    pub price_per_unit: f64,
    pub stock: bool,
    pub discount_deadline: Option<DateTime<Utc>>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    /// Fields that were present but unreadable.
    pub diagnostics: Vec<MalformedField>,
}

/// Normalizes one raw record. `today` anchors year-less promotion dates.
#[must_use]
pub fn normalize_fields(raw: &RawScrapedFields, today: NaiveDate) -> NormalizedFields {
    let mut diagnostics = Vec::new();
    let code = raw.product_code.as_deref().unwrap_or_default();

    let title = raw
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    let price = match raw.price_text.as_ref().map(parse_price_text) {
        Some(Ok(value)) => value,
        Some(Err(e)) => {
            tracing::debug!(source = %raw.source, code, error = %e, "price defaulted to 0");
            diagnostics.push(e);
            0.0
        }
        None => {
            tracing::debug!(source = %raw.source, code, "no price text, defaulted to 0");
            0.0
        }
    };

    let old_price = match raw.old_price_text.as_ref().map(parse_price_text) {
        Some(Ok(old)) if old > 0.0 => old,
        Some(Err(e)) => {
            tracing::debug!(source = %raw.source, code, error = %e, "old price ignored");
            diagnostics.push(e);
            price
        }
        _ => price,
    };

    let (quantity, unit) = match extract_quantity(raw, title.as_deref(), price) {
        Ok(Some((quantity, unit))) => (Some(quantity), Some(unit)),
        Ok(None) => (None, None),
        Err(e) => {
            tracing::debug!(source = %raw.source, code, error = %e, "unit price ignored");
            diagnostics.push(e);
            from_size_token(raw, title.as_deref()).map_or((None, None), |(q, u)| (Some(q), Some(u)))
        }
    };

    let discount_deadline = match raw.validity_text.as_deref().map(|t| parse_deadline(t, today)) {
        Some(Ok(deadline)) => Some(deadline),
        Some(Err(e)) => {
            tracing::debug!(source = %raw.source, code, error = %e, "deadline ignored");
            diagnostics.push(e);
            None
        }
        None => None,
    };

    let title_text = title.as_deref().unwrap_or_default();

    NormalizedFields {
        search_name: search_name(title_text),
        brand: infer_brand(title_text, &raw.source),
        price,
        old_price,
        discount: compute_discount(price, old_price),
        price_per_unit: price_per_unit(price, quantity, unit.as_ref()),
        quantity,
        unit,
        stock: raw.in_stock.unwrap_or(true),
        discount_deadline,
        category: raw
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string),
        image_url: raw.image_url.clone(),
        title,
        diagnostics,
    }
}

/// Whole-percent discount of `value` against `old`, clamped to `0..=99`.
/// Zero when there is no real reduction or the price itself is unknown.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // clamped to 0..=99
pub fn compute_discount(value: f64, old: f64) -> u32 {
    if value <= 0.0 || old <= value {
        return 0;
    }
    ((old - value) / old * 100.0).round().clamp(0.0, MAX_DISCOUNT) as u32
}

/// Converts an amount to its canonical unit: `kg` to `g` and `l` to `ml`
/// (×1000). Spelling variants such as `kg.`, `ltr` or `litri` count as mass
/// and volume too. Other units pass through lowercased. Applying it to an
/// already canonical pair returns the pair unchanged.
#[must_use]
pub fn normalize_quantity(value: f64, unit_token: &str) -> (f64, Unit) {
    let token = unit_token.trim().to_lowercase();
    match token.trim_end_matches('.') {
        "kg" | "kilo" | "kgs" => (round2(value * 1000.0), Unit::Grams),
        "l" | "ltr" | "lt" | "litrs" | "litri" | "litre" | "liter" => {
            (round2(value * 1000.0), Unit::Millilitres)
        }
        "g" | "gr" => (round2(value), Unit::Grams),
        "ml" => (round2(value), Unit::Millilitres),
        _ => (round2(value), Unit::Other(token)),
    }
}

/// Quantity and unit by precedence: the per-unit price annotation, then a
/// size token in `quantity_text`, then one in the title.
///
/// # Errors
///
/// Returns [`MalformedField::UnitPrice`] when an annotation is present but
/// unreadable. Callers fall back to the size tokens.
pub fn extract_quantity(
    raw: &RawScrapedFields,
    title: Option<&str>,
    price: f64,
) -> Result<Option<(f64, Unit)>, MalformedField> {
    if let Some(text) = raw.unit_price_text.as_deref().filter(|t| !t.trim().is_empty()) {
        let (unit_price, unit) = parse_unit_price(text)?;
        if price > 0.0 && unit_price > 0.0 {
            return Ok(Some(normalize_quantity(price / unit_price, &unit)));
        }
    }
    Ok(from_size_token(raw, title))
}

fn from_size_token(raw: &RawScrapedFields, title: Option<&str>) -> Option<(f64, Unit)> {
    raw.quantity_text
        .as_deref()
        .and_then(find_quantity_token)
        .or_else(|| title.and_then(find_quantity_token))
        .map(|(value, unit)| normalize_quantity(value, &unit))
}

/// Price per 1000 units for `g`/`ml`, per single unit otherwise; `0` without
/// a positive quantity.
#[must_use]
pub fn price_per_unit(price: f64, quantity: Option<f64>, unit: Option<&Unit>) -> f64 {
    match (quantity, unit) {
        (Some(q), Some(unit)) if q > 0.0 && unit.is_mass_or_volume() => {
            round2(price * 1000.0 / q)
        }
        (Some(q), Some(_)) if q > 0.0 => round2(price / q),
        _ => 0.0,
    }
}

/// Lowercased matching key for a title: the part before the first comma,
/// without ALL-CAPS words or a leading number (fraction included).
#[must_use]
pub fn search_name(title: &str) -> String {
    let head = title.split(',').next().unwrap_or_default();
    let kept: Vec<&str> = head
        .split_whitespace()
        .filter(|w| !is_caps_word(w))
        .collect();
    kept.join(" ")
        .to_lowercase()
        .trim_start_matches(|c: char| {
            c.is_ascii_digit() || c == '.' || c == ',' || c.is_whitespace()
        })
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strips diacritics: canonical decomposition, then combining marks dropped.
#[must_use]
pub fn fold_diacritics(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// The longest run of two or more consecutive ALL-CAPS words (earliest wins
/// on ties), else the first ALL-CAPS word, else `source`.
#[must_use]
pub fn infer_brand(title: &str, source: &str) -> String {
    let words: Vec<&str> = title.split_whitespace().collect();

    let mut best: Option<(usize, usize)> = None;
    let mut start = 0;
    while start < words.len() {
        if !is_caps_word(words[start]) {
            start += 1;
            continue;
        }
        let mut end = start;
        while end < words.len() && is_caps_word(words[end]) {
            end += 1;
        }
        let len = end - start;
        if len >= 2 && best.is_none_or(|(_, best_len)| len > best_len) {
            best = Some((start, len));
        }
        start = end;
    }

    if let Some((start, len)) = best {
        return words[start..start + len]
            .iter()
            .copied()
            .map(trim_punctuation)
            .collect::<Vec<_>>()
            .join(" ");
    }
    words
        .iter()
        .find(|w| is_caps_word(w))
        .map_or_else(|| source.to_string(), |w| trim_punctuation(w).to_string())
}

/// At least two letters and no lowercase letter. Digits and punctuation are
/// ignored, so `"100g"` is not a caps word but `"M&M'S"` is.
fn is_caps_word(word: &str) -> bool {
    let letters = word.chars().filter(|c| c.is_alphabetic()).count();
    letters >= 2 && !word.chars().any(char::is_lowercase)
}

fn trim_punctuation(word: &str) -> &str {
    word.trim_matches(|c: char| !c.is_alphanumeric())
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
