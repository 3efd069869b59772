use chrono::{DateTime, Utc};

use grocy_core::{CatalogRecord, Identity, PriceInfo, TimeInfo, CURRENCY_EUR};
use grocy_scraper::NormalizedFields;

/// Assembles a candidate record stamped with `now` as both `created` and
/// `updated`. Never fails; absent pieces stay `None` or empty.
#[must_use]
pub fn build_record(
    identity: Identity,
    normalized: NormalizedFields,
    now: DateTime<Utc>,
) -> CatalogRecord {
    let store = identity.source.clone();
    CatalogRecord {
        name: normalized.title.unwrap_or_default(),
        search_name: normalized.search_name,
        brand: normalized.brand,
        category: normalized.category,
        store,
        stock: normalized.stock,
        unit: normalized.unit,
        quantity: normalized.quantity,
        price: PriceInfo {
            value: normalized.price,
            old_value: normalized.old_price,
            discount: normalized.discount,
            currency: CURRENCY_EUR.to_string(),
            price_per_unit: normalized.price_per_unit,
        },
        time: TimeInfo {
            created: now,
            updated: now,
            discount_deadline: normalized.discount_deadline,
        },
        image_url: normalized.image_url,
        identity,
    }
}
