//! Low-level text parsers for price, per-unit price, size and validity
//! strings. See [`crate::normalize`] for how they compose.

use std::sync::LazyLock;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use regex::Regex;

use grocy_core::PriceText;

use crate::error::MalformedField;

/// `"2,58 €/kg"`, `"0.99 EUR / l"`, `"0,35€/gab."`
static UNIT_PRICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:[.,]\d+)?)\s*(?:€|eur)?\s*/\s*(\p{L}+\.?)")
        .expect("valid unit price regex")
});

/// A size token such as `"500 g"`, `"1,5l"` or `"10 gab."`. The unit must not
/// run into another letter, so `"100 gramu"` is not a match.
static QUANTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:[.,]\d+)?)\s*(kg|ml|gab\.|gab|gb\.|pcs|g|l)(?:[^\p{L}]|$)")
        .expect("valid quantity regex")
});

/// `dd.mm.yyyy` or `dd.mm.` with the year left off.
static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})\.(\d{1,2})\.(\d{4})?").expect("valid date regex")
});

/// Dates without a year more than this far in the past are taken to be next
/// year's.
const YEAR_ROLLOVER_DAYS: i64 = 180;

/// Parses a rendered price into euros, rounded to cents.
///
/// # Errors
///
/// Returns [`MalformedField::Price`] when no non-negative number can be read.
pub fn parse_price_text(text: &PriceText) -> Result<f64, MalformedField> {
    let (candidate, original) = match text {
        PriceText::Split { whole, fraction } => {
            let whole_digits: String = whole.chars().filter(char::is_ascii_digit).collect();
            let fraction_digits: String =
                fraction.chars().filter(char::is_ascii_digit).collect();
            let joined = if fraction_digits.is_empty() {
                whole_digits
            } else {
                format!("{whole_digits}.{fraction_digits}")
            };
            (joined, format!("{whole}|{fraction}"))
        }
        PriceText::Single(raw) => {
            // With a decimal comma, dots can only be thousands separators.
            let decimal_comma = raw.contains(',');
            let cleaned: String = raw
                .to_lowercase()
                .chars()
                .filter(|c| *c != '€' && !c.is_whitespace() && !(decimal_comma && *c == '.'))
                .map(|c| if c == ',' { '.' } else { c })
                .collect();
            let cleaned = cleaned.trim_end_matches("eur").to_string();
            (cleaned, raw.clone())
        }
    };

    match candidate.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(round2(value)),
        _ => Err(MalformedField::Price(original)),
    }
}

/// Parses a per-unit price annotation into `(unit_price, unit)`. The unit is
/// lowercased and not yet converted.
///
/// # Errors
///
/// Returns [`MalformedField::UnitPrice`] when the text has no
/// `number / unit` shape.
pub fn parse_unit_price(text: &str) -> Result<(f64, String), MalformedField> {
    let caps = UNIT_PRICE_RE
        .captures(text)
        .ok_or_else(|| MalformedField::UnitPrice(text.to_string()))?;
    let value = parse_decimal(&caps[1]).ok_or_else(|| MalformedField::UnitPrice(text.to_string()))?;
    Ok((value, caps[2].to_lowercase()))
}

/// Finds the first size token in `text` as `(amount, unit)`, unit lowercased.
#[must_use]
pub fn find_quantity_token(text: &str) -> Option<(f64, String)> {
    QUANTITY_RE.captures_iter(text).find_map(|caps| {
        let value = parse_decimal(&caps[1])?;
        Some((value, caps[2].to_lowercase()))
    })
}

/// Reads the promotion end from a validity text: the last date mentioned,
/// at the end of that day (UTC).
///
/// # Errors
///
/// Returns [`MalformedField::Deadline`] when no valid calendar date is found.
pub fn parse_deadline(text: &str, today: NaiveDate) -> Result<DateTime<Utc>, MalformedField> {
    let malformed = || MalformedField::Deadline(text.to_string());
    let caps = DATE_RE.captures_iter(text).last().ok_or_else(malformed)?;

    let day: u32 = caps[1].parse().map_err(|_| malformed())?;
    let month: u32 = caps[2].parse().map_err(|_| malformed())?;

    let date = match caps.get(3) {
        Some(year) => {
            let year: i32 = year.as_str().parse().map_err(|_| malformed())?;
            NaiveDate::from_ymd_opt(year, month, day).ok_or_else(malformed)?
        }
        None => {
            let this_year =
                NaiveDate::from_ymd_opt(today.year(), month, day).ok_or_else(malformed)?;
            if (today - this_year).num_days() > YEAR_ROLLOVER_DAYS {
                NaiveDate::from_ymd_opt(today.year() + 1, month, day).ok_or_else(malformed)?
            } else {
                this_year
            }
        }
    };

    date.and_hms_opt(23, 59, 59)
        .map(|dt| dt.and_utc())
        .ok_or_else(malformed)
}

/// Rounds to two decimal places.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn parse_decimal(raw: &str) -> Option<f64> {
    raw.replace(',', ".").parse::<f64>().ok()
}
