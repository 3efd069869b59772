//! The catalog store capability the engine reconciles against.

use async_trait::async_trait;

use grocy_core::{CatalogRecord, Identity};

use crate::diff::RecordDiff;
use crate::error::StoreError;

/// Store-assigned key of a persisted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StoredId(pub i64);

impl std::fmt::Display for StoredId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub id: StoredId,
    pub record: CatalogRecord,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    Any,
    Missing,
    Present,
}

/// Selection for [`CatalogStore::scan`]. Results come back in id order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub source: Option<String>,
    pub category: CategoryFilter,
}

impl RecordFilter {
    /// Records that still need a category.
    #[must_use]
    pub fn uncategorized() -> Self {
        Self {
            source: None,
            category: CategoryFilter::Missing,
        }
    }

    /// Categorized records of one source, the fuzzy-vote reference set.
    #[must_use]
    pub fn reference(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            category: CategoryFilter::Present,
        }
    }

    #[must_use]
    pub fn matches(&self, record: &CatalogRecord) -> bool {
        let source_ok = self
            .source
            .as_deref()
            .is_none_or(|s| record.identity.source == s);
        let category_ok = match self.category {
            CategoryFilter::Any => true,
            CategoryFilter::Missing => record.category.is_none(),
            CategoryFilter::Present => record.category.is_some(),
        };
        source_ok && category_ok
    }
}

/// Persistence seam. Implementations must enforce identity uniqueness and
/// apply each update atomically.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn find_by_identity(&self, identity: &Identity)
        -> Result<Option<StoredRecord>, StoreError>;

    /// Inserts a new record.
    ///
    /// Returns [`StoreError::Duplicate`] when the identity already exists.
    async fn insert(&self, record: &CatalogRecord) -> Result<StoredId, StoreError>;

    /// Writes only the fields named by `diff` and returns the stored result.
    async fn update(&self, id: StoredId, diff: &RecordDiff) -> Result<CatalogRecord, StoreError>;

    async fn scan(&self, filter: &RecordFilter) -> Result<Vec<StoredRecord>, StoreError>;

    /// Sets the category only while it is still missing. Returns `false` when
    /// another writer got there first.
    async fn assign_category(&self, id: StoredId, category: &str) -> Result<bool, StoreError>;
}
