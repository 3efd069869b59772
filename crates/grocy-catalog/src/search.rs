//! Fuzzy nearest-neighbour lookup over the reference catalog.

use grocy_scraper::normalize::fold_diacritics;

use crate::error::StoreError;
use crate::store::{CatalogStore, RecordFilter, StoredId, StoredRecord};

/// One fuzzy match, scored `0..=100`.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub id: StoredId,
    pub name: String,
    pub category: Option<String>,
    pub score: f64,
}

pub trait CandidateSearch: Send + Sync {
    /// Best matches for `query`, highest score first, at most the configured
    /// limit and none below the configured cutoff.
    fn search(&self, query: &str) -> Vec<Candidate>;
}

#[derive(Debug, Clone)]
struct Entry {
    id: StoredId,
    key: String,
    name: String,
    category: Option<String>,
}

/// In-process index of the reference source, built from one store scan.
/// Matching is case- and diacritic-insensitive.
#[derive(Debug, Clone)]
pub struct ReferenceIndex {
    entries: Vec<Entry>,
    limit: usize,
    score_cutoff: f64,
}

impl ReferenceIndex {
    /// Builds an index over `records`, keeping their order for tie-breaks.
    #[must_use]
    pub fn new(records: Vec<StoredRecord>, limit: usize, score_cutoff: f64) -> Self {
        let entries = records
            .into_iter()
            .map(|stored| {
                let basis = if stored.record.search_name.is_empty() {
                    &stored.record.name
                } else {
                    &stored.record.search_name
                };
                Entry {
                    id: stored.id,
                    key: match_key(basis),
                    name: stored.record.name,
                    category: stored.record.category,
                }
            })
            .collect();
        Self {
            entries,
            limit,
            score_cutoff,
        }
    }

    /// Loads the categorized records of `source` and indexes them.
    ///
    /// # Errors
    ///
    /// Propagates the store's scan failure.
    pub async fn load(
        store: &dyn CatalogStore,
        source: &str,
        limit: usize,
        score_cutoff: f64,
    ) -> Result<Self, StoreError> {
        let records = store.scan(&RecordFilter::reference(source)).await?;
        Ok(Self::new(records, limit, score_cutoff))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CandidateSearch for ReferenceIndex {
    fn search(&self, query: &str) -> Vec<Candidate> {
        let query = match_key(query);
        if query.is_empty() || self.limit == 0 {
            return Vec::new();
        }

        let mut candidates: Vec<Candidate> = self
            .entries
            .iter()
            .filter_map(|entry| {
                let score = strsim::normalized_levenshtein(&query, &entry.key) * 100.0;
                (score >= self.score_cutoff).then(|| Candidate {
                    id: entry.id,
                    name: entry.name.clone(),
                    category: entry.category.clone(),
                    score,
                })
            })
            .collect();

        // Stable sort: equal scores keep reference scan order.
        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
        candidates.truncate(self.limit);
        candidates
    }
}

fn match_key(text: &str) -> String {
    fold_diacritics(&text.to_lowercase())
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
