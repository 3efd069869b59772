use grocy_core::{Identity, RawScrapedFields};

use crate::error::ReconcileError;

/// Derives the cross-run identity of a raw record.
///
/// # Errors
///
/// Returns [`ReconcileError::MissingIdentity`] when the product code is
/// missing or blank.
pub fn resolve_identity(raw: &RawScrapedFields) -> Result<Identity, ReconcileError> {
    match raw.product_code.as_deref().map(str::trim) {
        Some(code) if !code.is_empty() => Ok(Identity::new(raw.source.clone(), code)),
        _ => Err(ReconcileError::MissingIdentity {
            feed: raw.source.clone(),
        }),
    }
}
