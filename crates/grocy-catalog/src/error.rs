use thiserror::Error;

use grocy_core::Identity;

use crate::store::StoredId;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The `(source, product_code)` uniqueness constraint rejected an insert.
    #[error("a record with identity {identity} already exists")]
    Duplicate { identity: Identity },

    #[error("no stored record with id {0}")]
    NotFound(StoredId),

    /// Transport or backend failure; the caller may retry later.
    #[error("catalog store unavailable: {0}")]
    Unavailable(String),
}

/// Record-local failures. None of them stops a feed.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("record from {feed} has no product code")]
    MissingIdentity { feed: String },

    #[error("record {identity} has an empty title")]
    MissingTitle { identity: Identity },

    #[error("store error for {identity}: {error}")]
    Store {
        identity: Identity,
        #[source]
        error: StoreError,
    },
}

impl ReconcileError {
    /// `true` when the record was dropped rather than failed.
    #[must_use]
    pub fn is_drop(&self) -> bool {
        matches!(
            self,
            ReconcileError::MissingIdentity { .. } | ReconcileError::MissingTitle { .. }
        )
    }
}
