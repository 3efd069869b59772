//! Field-level diff between a candidate record and its stored version.

use chrono::{DateTime, Utc};

use grocy_core::{CatalogRecord, PriceInfo, Unit};

/// One changed field and its new value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldChange {
    Name(String),
    SearchName(String),
    Brand(String),
    Category(Option<String>),
    Store(String),
    Stock(bool),
    Unit(Option<Unit>),
    Quantity(Option<f64>),
    /// The whole price group; subfields are never diffed separately.
    Price(PriceInfo),
    /// A changed promotion deadline, written together with the new `updated`.
    Time {
        discount_deadline: Option<DateTime<Utc>>,
        updated: DateTime<Utc>,
    },
    ImageUrl(Option<String>),
}

impl FieldChange {
    /// Column-style name of the changed field.
    #[must_use]
    pub fn field(&self) -> &'static str {
        match self {
            FieldChange::Name(_) => "name",
            FieldChange::SearchName(_) => "search_name",
            FieldChange::Brand(_) => "brand",
            FieldChange::Category(_) => "category",
            FieldChange::Store(_) => "store",
            FieldChange::Stock(_) => "stock",
            FieldChange::Unit(_) => "unit",
            FieldChange::Quantity(_) => "quantity",
            FieldChange::Price(_) => "price",
            FieldChange::Time { .. } => "time",
            FieldChange::ImageUrl(_) => "image_url",
        }
    }
}

/// Minimal set of changes turning a stored record into the candidate.
///
/// `updated` is the timestamp a non-empty diff stamps on the record; on its
/// own it is never a change.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDiff {
    pub changes: Vec<FieldChange>,
    pub updated: DateTime<Utc>,
}

impl RecordDiff {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    #[must_use]
    pub fn fields(&self) -> Vec<&'static str> {
        self.changes.iter().map(FieldChange::field).collect()
    }

    /// Applies the diff to `stored`. Reported fields take their new value,
    /// everything else is kept, and `time.updated` is refreshed unless the
    /// diff is empty.
    #[must_use]
    pub fn apply(&self, stored: &CatalogRecord) -> CatalogRecord {
        let mut record = stored.clone();
        for change in &self.changes {
            match change {
                FieldChange::Name(v) => record.name.clone_from(v),
                FieldChange::SearchName(v) => record.search_name.clone_from(v),
                FieldChange::Brand(v) => record.brand.clone_from(v),
                FieldChange::Category(v) => record.category.clone_from(v),
                FieldChange::Store(v) => record.store.clone_from(v),
                FieldChange::Stock(v) => record.stock = *v,
                FieldChange::Unit(v) => record.unit.clone_from(v),
                FieldChange::Quantity(v) => record.quantity = *v,
                FieldChange::Price(v) => record.price.clone_from(v),
                FieldChange::Time {
                    discount_deadline, ..
                } => record.time.discount_deadline = *discount_deadline,
                FieldChange::ImageUrl(v) => record.image_url.clone_from(v),
            }
        }
        if !self.is_empty() {
            record.time.updated = self.updated;
        }
        record
    }
}

/// Computes the diff from `stored` to `candidate`. Pure; `created` and a
/// bare `updated` difference are ignored.
#[must_use]
pub fn diff(candidate: &CatalogRecord, stored: &CatalogRecord) -> RecordDiff {
    let mut changes = Vec::new();

    if candidate.name != stored.name {
        changes.push(FieldChange::Name(candidate.name.clone()));
    }
    if candidate.search_name != stored.search_name {
        changes.push(FieldChange::SearchName(candidate.search_name.clone()));
    }
    if candidate.brand != stored.brand {
        changes.push(FieldChange::Brand(candidate.brand.clone()));
    }
    if candidate.category != stored.category {
        changes.push(FieldChange::Category(candidate.category.clone()));
    }
    if candidate.store != stored.store {
        changes.push(FieldChange::Store(candidate.store.clone()));
    }
    if candidate.stock != stored.stock {
        changes.push(FieldChange::Stock(candidate.stock));
    }
    if candidate.unit != stored.unit {
        changes.push(FieldChange::Unit(candidate.unit.clone()));
    }
    if candidate.quantity != stored.quantity {
        changes.push(FieldChange::Quantity(candidate.quantity));
    }
    if candidate.price != stored.price {
        changes.push(FieldChange::Price(candidate.price.clone()));
    }
    if candidate.time.discount_deadline != stored.time.discount_deadline {
        changes.push(FieldChange::Time {
            discount_deadline: candidate.time.discount_deadline,
            updated: candidate.time.updated,
        });
    }
    if candidate.image_url != stored.image_url {
        changes.push(FieldChange::ImageUrl(candidate.image_url.clone()));
    }

    RecordDiff {
        changes,
        updated: candidate.time.updated,
    }
}

/// Copies what a fresh scrape cannot know from the stored record into the
/// candidate: `created`, plus `category` and `image_url` when the candidate
/// has none.
pub fn carry_forward(candidate: &mut CatalogRecord, stored: &CatalogRecord) {
    candidate.time.created = stored.time.created;
    if candidate.category.is_none() {
        candidate.category.clone_from(&stored.category);
    }
    if candidate.image_url.is_none() {
        candidate.image_url.clone_from(&stored.image_url);
    }
}

#[cfg(test)]
#[path = "diff_test.rs"]
mod tests;
