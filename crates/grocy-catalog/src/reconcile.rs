//! Per-record and per-feed reconciliation against a [`CatalogStore`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use grocy_core::{CatalogRecord, RawScrapedFields};
use grocy_scraper::{normalize_fields, ScraperError};

use crate::builder::build_record;
use crate::diff::{carry_forward, diff};
use crate::error::{ReconcileError, StoreError};
use crate::identity::resolve_identity;
use crate::store::{CatalogStore, StoredId, StoredRecord};

/// What happened to one record that reached the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Inserted(StoredId),
    Updated {
        id: StoredId,
        fields: Vec<&'static str>,
    },
    /// Nothing changed; no write.
    Skipped(StoredId),
}

/// Counters for one feed pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedSummary {
    pub received: usize,
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
    pub dropped: usize,
    pub failed: usize,
    /// The stop signal ended the pass before the feed was exhausted.
    pub cancelled: bool,
}

pub struct Reconciler {
    store: Arc<dyn CatalogStore>,
    stop: Option<watch::Receiver<bool>>,
}

impl Reconciler {
    #[must_use]
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store, stop: None }
    }

    /// Checks `stop` before each record; once it reads `true` the feed ends
    /// after the record in flight.
    #[must_use]
    pub fn with_stop_signal(mut self, stop: watch::Receiver<bool>) -> Self {
        self.stop = Some(stop);
        self
    }

    fn stop_requested(&self) -> bool {
        self.stop.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Normalizes, builds and reconciles one raw record.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::MissingIdentity`] or
    /// [`ReconcileError::MissingTitle`] for records that must be dropped, and
    /// [`ReconcileError::Store`] when the store fails.
    pub async fn reconcile_one(
        &self,
        raw: &RawScrapedFields,
        now: DateTime<Utc>,
    ) -> Result<Outcome, ReconcileError> {
        let identity = resolve_identity(raw)?;
        let normalized = normalize_fields(raw, now.date_naive());
        if normalized.title.is_none() {
            return Err(ReconcileError::MissingTitle { identity });
        }
        let candidate = build_record(identity, normalized, now);

        let store_err = |error: StoreError| ReconcileError::Store {
            identity: candidate.identity.clone(),
            error,
        };

        let existing = self
            .store
            .find_by_identity(&candidate.identity)
            .await
            .map_err(store_err)?;

        match existing {
            Some(stored) => self.update_existing(candidate, stored).await,
            None => match self.store.insert(&candidate).await {
                Ok(id) => {
                    tracing::debug!(identity = %candidate.identity, id = %id, "inserted record");
                    Ok(Outcome::Inserted(id))
                }
                Err(StoreError::Duplicate { .. }) => {
                    // Another worker inserted it between our find and insert.
                    tracing::debug!(identity = %candidate.identity, "insert raced, retrying as update");
                    let stored = self
                        .store
                        .find_by_identity(&candidate.identity)
                        .await
                        .map_err(store_err)?
                        .ok_or_else(|| {
                            store_err(StoreError::Duplicate {
                                identity: candidate.identity.clone(),
                            })
                        })?;
                    self.update_existing(candidate, stored).await
                }
                Err(e) => Err(store_err(e)),
            },
        }
    }

    async fn update_existing(
        &self,
        mut candidate: CatalogRecord,
        stored: StoredRecord,
    ) -> Result<Outcome, ReconcileError> {
        carry_forward(&mut candidate, &stored.record);
        let changes = diff(&candidate, &stored.record);

        if changes.is_empty() {
            tracing::info!(identity = %candidate.identity, "skipping record, nothing changed");
            return Ok(Outcome::Skipped(stored.id));
        }

        let fields = changes.fields();
        self.store
            .update(stored.id, &changes)
            .await
            .map_err(|error| ReconcileError::Store {
                identity: candidate.identity.clone(),
                error,
            })?;
        tracing::debug!(identity = %candidate.identity, fields = ?fields, "updated record");
        Ok(Outcome::Updated {
            id: stored.id,
            fields,
        })
    }

    /// Reconciles a feed in order. Every failure is confined to its record;
    /// the pass only ends early on the stop signal.
    pub async fn reconcile_feed<I>(&self, records: I) -> FeedSummary
    where
        I: IntoIterator<Item = Result<RawScrapedFields, ScraperError>>,
    {
        let mut summary = FeedSummary::default();

        for item in records {
            if self.stop_requested() {
                tracing::info!(received = summary.received, "stop requested, ending feed");
                summary.cancelled = true;
                break;
            }
            summary.received += 1;

            let raw = match item {
                Ok(raw) => raw,
                Err(e @ ScraperError::FeedIo { .. }) => {
                    tracing::error!(error = %e, "feed read failed");
                    summary.failed += 1;
                    continue;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "dropping unreadable record");
                    summary.dropped += 1;
                    continue;
                }
            };

            match self.reconcile_one(&raw, Utc::now()).await {
                Ok(Outcome::Inserted(_)) => summary.inserted += 1,
                Ok(Outcome::Updated { .. }) => summary.updated += 1,
                Ok(Outcome::Skipped(_)) => summary.skipped += 1,
                Err(e) if e.is_drop() => {
                    tracing::warn!(source = %raw.source, error = %e, "dropping record");
                    summary.dropped += 1;
                }
                Err(e) => {
                    tracing::error!(source = %raw.source, error = %e, "record failed");
                    summary.failed += 1;
                }
            }
        }

        summary
    }
}

#[cfg(test)]
#[path = "reconcile_test.rs"]
mod tests;
