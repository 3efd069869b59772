use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::TimeZone;

use grocy_core::{Identity, PriceText};

use super::*;
use crate::diff::RecordDiff;
use crate::memory::MemoryCatalogStore;
use crate::store::RecordFilter;

fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, day, 8, 0, 0).unwrap()
}

fn raw(code: &str, title: &str, whole: &str, fraction: &str) -> RawScrapedFields {
    RawScrapedFields {
        source: "Rimi".to_owned(),
        product_code: Some(code.to_owned()),
        title: Some(title.to_owned()),
        price_text: Some(PriceText::Split {
            whole: whole.to_owned(),
            fraction: fraction.to_owned(),
        }),
        ..RawScrapedFields::default()
    }
}

async fn stored(store: &MemoryCatalogStore, code: &str) -> StoredRecord {
    store
        .find_by_identity(&Identity::new("Rimi", code))
        .await
        .unwrap()
        .unwrap()
}

/// Hides the stored record from the first lookup, as if another worker
/// inserted it right after.
struct RacingStore {
    inner: MemoryCatalogStore,
    hide_next_find: AtomicBool,
}

#[async_trait]
impl CatalogStore for RacingStore {
    async fn find_by_identity(
        &self,
        identity: &Identity,
    ) -> Result<Option<StoredRecord>, StoreError> {
        if self.hide_next_find.swap(false, Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.find_by_identity(identity).await
    }

    async fn insert(&self, record: &CatalogRecord) -> Result<StoredId, StoreError> {
        self.inner.insert(record).await
    }

    async fn update(&self, id: StoredId, diff: &RecordDiff) -> Result<CatalogRecord, StoreError> {
        self.inner.update(id, diff).await
    }

    async fn scan(&self, filter: &RecordFilter) -> Result<Vec<StoredRecord>, StoreError> {
        self.inner.scan(filter).await
    }

    async fn assign_category(&self, id: StoredId, category: &str) -> Result<bool, StoreError> {
        self.inner.assign_category(id, category).await
    }
}

/// Fails every write for product codes starting with `"BAD"`, and flips a
/// stop signal after the first successful insert when one is attached.
struct FlakyStore {
    inner: MemoryCatalogStore,
    stop_after_insert: Option<watch::Sender<bool>>,
}

#[async_trait]
impl CatalogStore for FlakyStore {
    async fn find_by_identity(
        &self,
        identity: &Identity,
    ) -> Result<Option<StoredRecord>, StoreError> {
        self.inner.find_by_identity(identity).await
    }

    async fn insert(&self, record: &CatalogRecord) -> Result<StoredId, StoreError> {
        if record.identity.product_code.starts_with("BAD") {
            return Err(StoreError::Unavailable("connection reset".to_owned()));
        }
        let id = self.inner.insert(record).await?;
        if let Some(stop) = &self.stop_after_insert {
            stop.send_replace(true);
        }
        Ok(id)
    }

    async fn update(&self, id: StoredId, diff: &RecordDiff) -> Result<CatalogRecord, StoreError> {
        self.inner.update(id, diff).await
    }

    async fn scan(&self, filter: &RecordFilter) -> Result<Vec<StoredRecord>, StoreError> {
        self.inner.scan(filter).await
    }

    async fn assign_category(&self, id: StoredId, category: &str) -> Result<bool, StoreError> {
        self.inner.assign_category(id, category).await
    }
}

// -----------------------------------------------------------------------
// reconcile_one
// -----------------------------------------------------------------------

#[tokio::test]
async fn first_sighting_inserts_with_created_equal_updated() {
    let store = Arc::new(MemoryCatalogStore::new());
    let reconciler = Reconciler::new(store.clone());

    let outcome = reconciler
        .reconcile_one(&raw("P1", "Svaigs piens 1 l", "1", "29"), at(14))
        .await
        .unwrap();

    assert!(matches!(outcome, Outcome::Inserted(_)));
    let record = stored(&store, "P1").await.record;
    assert_eq!(record.time.created, at(14));
    assert_eq!(record.time.updated, at(14));
    assert_eq!(record.quantity, Some(1000.0));
}

#[tokio::test]
async fn unchanged_record_is_skipped_without_write() {
    let store = Arc::new(MemoryCatalogStore::new());
    let reconciler = Reconciler::new(store.clone());
    let input = raw("P3", "Maize 500 g", "1", "10");
    reconciler.reconcile_one(&input, at(14)).await.unwrap();

    let outcome = reconciler.reconcile_one(&input, at(15)).await.unwrap();

    assert!(matches!(outcome, Outcome::Skipped(_)));
    assert_eq!(stored(&store, "P3").await.record.time.updated, at(14));
}

#[tokio::test]
async fn price_drop_updates_price_and_keeps_created() {
    let store = Arc::new(MemoryCatalogStore::new());
    let reconciler = Reconciler::new(store.clone());
    reconciler
        .reconcile_one(&raw("P2", "Siers 200 g", "2", "00"), at(14))
        .await
        .unwrap();

    let mut discounted = raw("P2", "Siers 200 g", "1", "50");
    discounted.old_price_text = Some(PriceText::Single("2,00".to_owned()));
    let outcome = reconciler.reconcile_one(&discounted, at(15)).await.unwrap();

    assert_eq!(
        outcome,
        Outcome::Updated {
            id: StoredId(1),
            fields: vec!["price"],
        }
    );
    let record = stored(&store, "P2").await.record;
    assert_eq!(record.price.value, 1.5);
    assert_eq!(record.price.old_value, 2.0);
    assert_eq!(record.price.discount, 25);
    assert_eq!(record.price.price_per_unit, 7.5);
    assert_eq!(record.time.created, at(14));
    assert_eq!(record.time.updated, at(15));
}

#[tokio::test]
async fn assigned_category_survives_a_scrape_without_one() {
    let store = Arc::new(MemoryCatalogStore::new());
    let reconciler = Reconciler::new(store.clone());
    reconciler
        .reconcile_one(&raw("P4", "Jogurts 150 g", "0", "89"), at(14))
        .await
        .unwrap();
    let id = stored(&store, "P4").await.id;
    store.assign_category(id, "Piena produkti").await.unwrap();

    let outcome = reconciler
        .reconcile_one(&raw("P4", "Jogurts 150 g", "0", "89"), at(15))
        .await
        .unwrap();

    assert!(matches!(outcome, Outcome::Skipped(_)));
    assert_eq!(
        stored(&store, "P4").await.record.category.as_deref(),
        Some("Piena produkti")
    );
}

#[tokio::test]
async fn missing_code_and_blank_title_are_dropped() {
    let store = Arc::new(MemoryCatalogStore::new());
    let reconciler = Reconciler::new(store.clone());

    let mut no_code = raw("", "Maize", "1", "00");
    no_code.product_code = None;
    let err = reconciler.reconcile_one(&no_code, at(14)).await.unwrap_err();
    assert!(matches!(err, ReconcileError::MissingIdentity { .. }));

    let err = reconciler
        .reconcile_one(&raw("P5", "  ", "1", "00"), at(14))
        .await
        .unwrap_err();
    assert!(matches!(err, ReconcileError::MissingTitle { .. }));
    assert!(err.is_drop());
    assert!(store.is_empty().unwrap());
}

#[tokio::test]
async fn duplicate_insert_is_retried_as_update() {
    let racing = Arc::new(RacingStore {
        inner: MemoryCatalogStore::new(),
        hide_next_find: AtomicBool::new(true),
    });
    let today = at(14).date_naive();
    racing
        .inner
        .insert(&build_record(
            Identity::new("Rimi", "P6"),
            normalize_fields(&raw("P6", "Kafija 250 g", "4", "99"), today),
            at(14),
        ))
        .await
        .unwrap();
    let reconciler = Reconciler::new(racing.clone());

    let outcome = reconciler
        .reconcile_one(&raw("P6", "Kafija 250 g", "3", "99"), at(15))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        Outcome::Updated {
            id: StoredId(1),
            fields: vec!["price"],
        }
    );
    assert_eq!(racing.inner.len().unwrap(), 1);
    let record = racing
        .inner
        .find_by_identity(&Identity::new("Rimi", "P6"))
        .await
        .unwrap()
        .unwrap()
        .record;
    assert_eq!(record.price.value, 3.99);
    assert_eq!(record.time.created, at(14));
}

// -----------------------------------------------------------------------
// reconcile_feed
// -----------------------------------------------------------------------

#[tokio::test]
async fn feed_isolates_failures_and_counts_outcomes() {
    let store = Arc::new(FlakyStore {
        inner: MemoryCatalogStore::new(),
        stop_after_insert: None,
    });
    let reconciler = Reconciler::new(store.clone());
    let decode_error = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();

    let summary = reconciler
        .reconcile_feed(vec![
            Ok(raw("A", "Maize 500 g", "1", "10")),
            Ok(raw("BAD1", "Piens 1 l", "1", "29")),
            Err(ScraperError::Deserialize {
                context: "rimi card at feed.jsonl:3".to_owned(),
                source: decode_error,
            }),
            Ok(raw("", "Bez koda", "1", "00")),
            Ok(raw("A", "Maize 500 g", "1", "10")),
            Ok(raw("C", "Siers 200 g", "2", "00")),
        ])
        .await;

    assert_eq!(
        summary,
        FeedSummary {
            received: 6,
            inserted: 2,
            updated: 0,
            skipped: 1,
            dropped: 2,
            failed: 1,
            cancelled: false,
        }
    );
    assert_eq!(store.inner.len().unwrap(), 2);
}

#[tokio::test]
async fn stop_signal_ends_feed_between_records() {
    let (tx, rx) = watch::channel(false);
    let store = Arc::new(FlakyStore {
        inner: MemoryCatalogStore::new(),
        stop_after_insert: Some(tx),
    });
    let reconciler = Reconciler::new(store.clone()).with_stop_signal(rx);

    let summary = reconciler
        .reconcile_feed(vec![
            Ok(raw("A", "Maize 500 g", "1", "10")),
            Ok(raw("B", "Piens 1 l", "1", "29")),
            Ok(raw("C", "Siers 200 g", "2", "00")),
        ])
        .await;

    assert!(summary.cancelled);
    assert_eq!(summary.received, 1);
    assert_eq!(summary.inserted, 1);
    assert_eq!(store.inner.len().unwrap(), 1);
}

#[tokio::test]
async fn empty_feed_is_an_empty_summary() {
    let reconciler = Reconciler::new(Arc::new(MemoryCatalogStore::new()));
    let summary = reconciler.reconcile_feed(Vec::new()).await;
    assert_eq!(summary, FeedSummary::default());
}
