//! Database operations for `catalog_records`, and the Postgres
//! [`CatalogStore`] built on them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use grocy_catalog::{
    CatalogStore, CategoryFilter, FieldChange, RecordDiff, RecordFilter, StoreError, StoredId,
    StoredRecord,
};
use grocy_core::{CatalogRecord, Identity, PriceInfo, TimeInfo, Unit};

use crate::DbError;

const COLUMNS: &str = "id, source, product_code, name, search_name, brand, category, store, \
     stock, unit, quantity, price_value, price_old_value, price_discount, price_currency, \
     price_per_unit, created_at, updated_at, discount_deadline, image_url";

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `catalog_records` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CatalogRow {
    pub id: i64,
    pub source: String,
    pub product_code: String,
    pub name: String,
    pub search_name: String,
    pub brand: String,
    pub category: Option<String>,
    pub store: String,
    pub stock: bool,
    /// `g`, `ml` or a literal unit; the schema rejects `kg` and `l`.
    pub unit: Option<String>,
    pub quantity: Option<f64>,
    pub price_value: f64,
    pub price_old_value: f64,
    /// `INTEGER NOT NULL CHECK (0..=99)`.
    pub price_discount: i32,
    pub price_currency: String,
    pub price_per_unit: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub discount_deadline: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
}

impl CatalogRow {
    /// Converts the row into the engine's record type.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidRow`] for a non-canonical unit or a negative
    /// discount.
    pub fn into_stored(self) -> Result<StoredRecord, DbError> {
        let id = self.id;
        let invalid = |reason: String| DbError::InvalidRow { id, reason };

        let unit = self
            .unit
            .as_deref()
            .map(Unit::parse_canonical)
            .transpose()
            .map_err(|e| invalid(e.to_string()))?;
        let discount = u32::try_from(self.price_discount)
            .map_err(|_| invalid(format!("negative discount {}", self.price_discount)))?;

        Ok(StoredRecord {
            id: StoredId(id),
            record: CatalogRecord {
                identity: Identity::new(self.source, self.product_code),
                name: self.name,
                search_name: self.search_name,
                brand: self.brand,
                category: self.category,
                store: self.store,
                stock: self.stock,
                unit,
                quantity: self.quantity,
                price: PriceInfo {
                    value: self.price_value,
                    old_value: self.price_old_value,
                    discount,
                    currency: self.price_currency,
                    price_per_unit: self.price_per_unit,
                },
                time: TimeInfo {
                    created: self.created_at,
                    updated: self.updated_at,
                    discount_deadline: self.discount_deadline,
                },
                image_url: self.image_url,
            },
        })
    }
}

// ---------------------------------------------------------------------------
// catalog_records operations
// ---------------------------------------------------------------------------

/// Looks up a record by its `(source, product_code)` identity.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_catalog_record(
    pool: &PgPool,
    identity: &Identity,
) -> Result<Option<CatalogRow>, DbError> {
    let row = sqlx::query_as::<_, CatalogRow>(&format!(
        "SELECT {COLUMNS} FROM catalog_records WHERE source = $1 AND product_code = $2"
    ))
    .bind(&identity.source)
    .bind(&identity.product_code)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Fetches a single record by its internal `id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_catalog_record(pool: &PgPool, id: i64) -> Result<CatalogRow, DbError> {
    sqlx::query_as::<_, CatalogRow>(&format!(
        "SELECT {COLUMNS} FROM catalog_records WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Inserts a record. Returns `None` when the identity already exists; the
/// existing row is left untouched.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_catalog_record(
    pool: &PgPool,
    record: &CatalogRecord,
) -> Result<Option<i64>, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO catalog_records \
             (source, product_code, name, search_name, brand, category, store, stock, unit, \
              quantity, price_value, price_old_value, price_discount, price_currency, \
              price_per_unit, created_at, updated_at, discount_deadline, image_url) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19) \
         ON CONFLICT (source, product_code) DO NOTHING \
         RETURNING id",
    )
    .bind(&record.identity.source)
    .bind(&record.identity.product_code)
    .bind(&record.name)
    .bind(&record.search_name)
    .bind(&record.brand)
    .bind(record.category.as_deref())
    .bind(&record.store)
    .bind(record.stock)
    .bind(record.unit.as_ref().map(Unit::as_str))
    .bind(record.quantity)
    .bind(record.price.value)
    .bind(record.price.old_value)
    .bind(discount_column(record.price.discount))
    .bind(&record.price.currency)
    .bind(record.price.price_per_unit)
    .bind(record.time.created)
    .bind(record.time.updated)
    .bind(record.time.discount_deadline)
    .bind(record.image_url.as_deref())
    .fetch_optional(pool)
    .await?;

    Ok(id)
}

/// Writes the fields named by `diff` plus `updated_at` in one statement and
/// returns the resulting row. An empty diff writes nothing and returns the
/// current row.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given `id`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_catalog_record(
    pool: &PgPool,
    id: i64,
    diff: &RecordDiff,
) -> Result<CatalogRow, DbError> {
    if diff.is_empty() {
        return get_catalog_record(pool, id).await;
    }

    let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new("UPDATE catalog_records SET ");
    let mut set = qb.separated(", ");
    for change in &diff.changes {
        match change {
            FieldChange::Name(v) => {
                set.push("name = ").push_bind_unseparated(v.clone());
            }
            FieldChange::SearchName(v) => {
                set.push("search_name = ").push_bind_unseparated(v.clone());
            }
            FieldChange::Brand(v) => {
                set.push("brand = ").push_bind_unseparated(v.clone());
            }
            FieldChange::Category(v) => {
                set.push("category = ").push_bind_unseparated(v.clone());
            }
            FieldChange::Store(v) => {
                set.push("store = ").push_bind_unseparated(v.clone());
            }
            FieldChange::Stock(v) => {
                set.push("stock = ").push_bind_unseparated(*v);
            }
            FieldChange::Unit(v) => {
                set.push("unit = ")
                    .push_bind_unseparated(v.as_ref().map(|u| u.as_str().to_string()));
            }
            FieldChange::Quantity(v) => {
                set.push("quantity = ").push_bind_unseparated(*v);
            }
            FieldChange::Price(price) => {
                set.push("price_value = ").push_bind_unseparated(price.value);
                set.push("price_old_value = ")
                    .push_bind_unseparated(price.old_value);
                set.push("price_discount = ")
                    .push_bind_unseparated(discount_column(price.discount));
                set.push("price_currency = ")
                    .push_bind_unseparated(price.currency.clone());
                set.push("price_per_unit = ")
                    .push_bind_unseparated(price.price_per_unit);
            }
            FieldChange::Time {
                discount_deadline, ..
            } => {
                set.push("discount_deadline = ")
                    .push_bind_unseparated(*discount_deadline);
            }
            FieldChange::ImageUrl(v) => {
                set.push("image_url = ").push_bind_unseparated(v.clone());
            }
        }
    }
    set.push("updated_at = ").push_bind_unseparated(diff.updated);

    qb.push(" WHERE id = ")
        .push_bind(id)
        .push(" RETURNING ")
        .push(COLUMNS);

    qb.build_query_as::<CatalogRow>()
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// Returns the records matching `filter`, ordered by `id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn scan_catalog_records(
    pool: &PgPool,
    filter: &RecordFilter,
) -> Result<Vec<CatalogRow>, DbError> {
    let mut qb: QueryBuilder<'_, Postgres> =
        QueryBuilder::new(format!("SELECT {COLUMNS} FROM catalog_records WHERE TRUE"));
    if let Some(source) = &filter.source {
        qb.push(" AND source = ").push_bind(source.clone());
    }
    match filter.category {
        CategoryFilter::Any => {}
        CategoryFilter::Missing => {
            qb.push(" AND category IS NULL");
        }
        CategoryFilter::Present => {
            qb.push(" AND category IS NOT NULL");
        }
    }
    qb.push(" ORDER BY id");

    let rows = qb.build_query_as::<CatalogRow>().fetch_all(pool).await?;
    Ok(rows)
}

/// Sets `category` only while it is still `NULL`. `updated_at` is left
/// alone. Returns `false` if the record already had a category.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn assign_catalog_category(
    pool: &PgPool,
    id: i64,
    category: &str,
) -> Result<bool, DbError> {
    let result = sqlx::query(
        "UPDATE catalog_records SET category = $1 WHERE id = $2 AND category IS NULL",
    )
    .bind(category)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() > 0 {
        return Ok(true);
    }

    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM catalog_records WHERE id = $1)",
    )
    .bind(id)
    .fetch_one(pool)
    .await?;

    if exists {
        Ok(false)
    } else {
        Err(DbError::NotFound)
    }
}

/// Discounts are 0..=99 after normalization.
fn discount_column(discount: u32) -> i32 {
    i32::try_from(discount).unwrap_or(i32::MAX)
}

// ---------------------------------------------------------------------------
// CatalogStore adapter
// ---------------------------------------------------------------------------

/// [`CatalogStore`] over a Postgres pool. Cloning shares the pool, so each
/// feed worker can hold its own handle.
#[derive(Debug, Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn store_error(id: Option<StoredId>, error: DbError) -> StoreError {
    match (error, id) {
        (DbError::NotFound, Some(id)) => StoreError::NotFound(id),
        (error, _) => StoreError::Unavailable(error.to_string()),
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn find_by_identity(
        &self,
        identity: &Identity,
    ) -> Result<Option<StoredRecord>, StoreError> {
        find_catalog_record(&self.pool, identity)
            .await
            .and_then(|row| row.map(CatalogRow::into_stored).transpose())
            .map_err(|e| store_error(None, e))
    }

    async fn insert(&self, record: &CatalogRecord) -> Result<StoredId, StoreError> {
        match insert_catalog_record(&self.pool, record).await {
            Ok(Some(id)) => Ok(StoredId(id)),
            Ok(None) => Err(StoreError::Duplicate {
                identity: record.identity.clone(),
            }),
            Err(e) => Err(store_error(None, e)),
        }
    }

    async fn update(&self, id: StoredId, diff: &RecordDiff) -> Result<CatalogRecord, StoreError> {
        update_catalog_record(&self.pool, id.0, diff)
            .await
            .and_then(CatalogRow::into_stored)
            .map(|stored| stored.record)
            .map_err(|e| store_error(Some(id), e))
    }

    async fn scan(&self, filter: &RecordFilter) -> Result<Vec<StoredRecord>, StoreError> {
        let rows = scan_catalog_records(&self.pool, filter)
            .await
            .map_err(|e| store_error(None, e))?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            match row.into_stored() {
                Ok(stored) => records.push(stored),
                Err(e) => tracing::warn!(error = %e, "skipping invalid catalog row"),
            }
        }
        Ok(records)
    }

    async fn assign_category(&self, id: StoredId, category: &str) -> Result<bool, StoreError> {
        assign_catalog_category(&self.pool, id.0, category)
            .await
            .map_err(|e| store_error(Some(id), e))
    }
}
