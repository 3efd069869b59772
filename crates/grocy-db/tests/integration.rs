//! Offline tests for grocy-db pool configuration and row conversion.
//! These tests do not require a live database connection.

use std::path::PathBuf;

use chrono::{TimeZone, Utc};
use grocy_core::{AppConfig, Unit};
use grocy_db::{CatalogRow, DbError, IngestRunRow, PoolConfig, RunType};

fn catalog_row(unit: Option<&str>, discount: i32) -> CatalogRow {
    let now = Utc.with_ymd_and_hms(2026, 10, 14, 8, 0, 0).unwrap();
    CatalogRow {
        id: 7,
        source: "Rimi".to_string(),
        product_code: "P1".to_string(),
        name: "Piens 1 l".to_string(),
        search_name: "piens 1 l".to_string(),
        brand: "Rimi".to_string(),
        category: Some("Piena produkti".to_string()),
        store: "Rimi".to_string(),
        stock: true,
        unit: unit.map(str::to_string),
        quantity: Some(1000.0),
        price_value: 0.99,
        price_old_value: 1.29,
        price_discount: discount,
        price_currency: "EUR".to_string(),
        price_per_unit: 0.99,
        created_at: now,
        updated_at: now,
        discount_deadline: None,
        image_url: None,
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: Some("postgres://example".to_string()),
        log_level: "info".to_string(),
        keywords_path: PathBuf::from("./config/keywords.txt"),
        reference_source: "Rimi".to_string(),
        fuzzy_limit: 10,
        fuzzy_score_cutoff: 30.0,
        max_concurrent_feeds: 4,
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[test]
fn catalog_row_converts_to_stored_record() {
    let stored = catalog_row(Some("ml"), 23).into_stored().unwrap();

    assert_eq!(stored.id.0, 7);
    assert_eq!(stored.record.identity.to_string(), "Rimi:P1");
    assert_eq!(stored.record.unit, Some(Unit::Millilitres));
    assert_eq!(stored.record.price.discount, 23);
    assert_eq!(stored.record.price.old_value, 1.29);
    assert_eq!(stored.record.category.as_deref(), Some("Piena produkti"));
}

#[test]
fn catalog_row_without_unit_converts() {
    let stored = catalog_row(None, 0).into_stored().unwrap();
    assert_eq!(stored.record.unit, None);
}

#[test]
fn catalog_row_with_unconverted_unit_is_invalid() {
    let err = catalog_row(Some("kg"), 0).into_stored().unwrap_err();
    assert!(matches!(err, DbError::InvalidRow { id: 7, .. }), "got {err:?}");
}

#[test]
fn catalog_row_with_negative_discount_is_invalid() {
    let err = catalog_row(Some("g"), -5).into_stored().unwrap_err();
    assert!(matches!(err, DbError::InvalidRow { id: 7, ref reason } if reason.contains("-5")));
}

#[test]
fn run_type_strings_match_schema() {
    assert_eq!(RunType::Ingest.as_str(), "ingest");
    assert_eq!(RunType::Categorize.as_str(), "categorize");
}

/// Compile-time smoke test: confirm that [`IngestRunRow`] has all expected
/// fields with the correct types. No database required.
#[test]
fn ingest_run_row_has_expected_fields() {
    let row = IngestRunRow {
        id: 1_i64,
        public_id: uuid::Uuid::new_v4(),
        run_type: "ingest".to_string(),
        source: Some("Rimi".to_string()),
        trigger_source: "cli".to_string(),
        status: "queued".to_string(),
        started_at: None,
        completed_at: None,
        records_processed: 0_i32,
        summary: None,
        error_message: None,
        created_at: Utc::now(),
    };

    assert_eq!(row.id, 1);
    assert_eq!(row.status, "queued");
    assert!(row.summary.is_none());
}
