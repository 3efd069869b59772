//! Category inference for records that arrive without one.
//!
//! Two passes, cheapest first: the keyword table, then a fuzzy vote among
//! the nearest categorized records of the reference source.

use grocy_core::{CatalogRecord, KeywordTable};

use crate::error::StoreError;
use crate::search::{Candidate, CandidateSearch};
use crate::store::{CatalogStore, RecordFilter};

/// How a category was found, if at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Keyword(String),
    Fuzzy(String),
    Unresolved,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategorizeSummary {
    pub scanned: usize,
    pub by_keyword: usize,
    pub by_fuzzy: usize,
    pub unresolved: usize,
    /// Records another writer categorized between scan and assignment.
    pub already_assigned: usize,
    pub failed: usize,
}

pub struct Categorizer {
    keywords: KeywordTable,
    search: Box<dyn CandidateSearch>,
}

impl Categorizer {
    #[must_use]
    pub fn new(keywords: KeywordTable, search: Box<dyn CandidateSearch>) -> Self {
        Self { keywords, search }
    }

    /// Resolves a category for one record without touching the store.
    #[must_use]
    pub fn resolve(&self, record: &CatalogRecord) -> Resolution {
        if let Some(category) = self.keywords.match_category(&record.name) {
            return Resolution::Keyword(category.to_string());
        }
        let query = if record.search_name.is_empty() {
            &record.name
        } else {
            &record.search_name
        };
        match vote(&self.search.search(query)) {
            Some(category) => Resolution::Fuzzy(category),
            None => Resolution::Unresolved,
        }
    }

    /// Categorizes every record whose category is missing. Assignment only
    /// succeeds while the category is still null and leaves `updated` alone.
    ///
    /// # Errors
    ///
    /// Returns the store error if the initial scan fails. Per-record
    /// assignment failures are counted in [`CategorizeSummary::failed`].
    pub async fn categorize_missing(
        &self,
        store: &dyn CatalogStore,
    ) -> Result<CategorizeSummary, StoreError> {
        let pending = store.scan(&RecordFilter::uncategorized()).await?;
        let mut summary = CategorizeSummary {
            scanned: pending.len(),
            ..CategorizeSummary::default()
        };

        for stored in pending {
            let identity = &stored.record.identity;
            let (category, by_keyword) = match self.resolve(&stored.record) {
                Resolution::Keyword(category) => (category, true),
                Resolution::Fuzzy(category) => (category, false),
                Resolution::Unresolved => {
                    tracing::debug!(identity = %identity, "no category found");
                    summary.unresolved += 1;
                    continue;
                }
            };

            match store.assign_category(stored.id, &category).await {
                Ok(true) => {
                    tracing::debug!(
                        identity = %identity,
                        category = %category,
                        by_keyword,
                        "assigned category"
                    );
                    if by_keyword {
                        summary.by_keyword += 1;
                    } else {
                        summary.by_fuzzy += 1;
                    }
                }
                Ok(false) => summary.already_assigned += 1,
                Err(e) => {
                    tracing::error!(identity = %identity, error = %e, "category assignment failed");
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }
}

/// The most frequent category among `candidates`; ties go to the category
/// that appeared first. Candidates without a category do not vote.
#[must_use]
pub fn vote(candidates: &[Candidate]) -> Option<String> {
    let mut tally: Vec<(&str, usize)> = Vec::new();
    for category in candidates.iter().filter_map(|c| c.category.as_deref()) {
        match tally.iter_mut().find(|(seen, _)| *seen == category) {
            Some((_, count)) => *count += 1,
            None => tally.push((category, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (category, count) in tally {
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((category, count));
        }
    }
    best.map(|(category, _)| category.to_string())
}

#[cfg(test)]
#[path = "categorize_test.rs"]
mod tests;
