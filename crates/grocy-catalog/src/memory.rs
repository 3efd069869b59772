//! In-process [`CatalogStore`], used for dry runs and engine tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use grocy_core::{CatalogRecord, Identity};

use crate::diff::RecordDiff;
use crate::error::StoreError;
use crate::store::{CatalogStore, RecordFilter, StoredId, StoredRecord};

#[derive(Debug, Default)]
struct State {
    next_id: i64,
    records: BTreeMap<StoredId, CatalogRecord>,
    by_identity: HashMap<Identity, StoredId>,
}

#[derive(Debug, Default)]
pub struct MemoryCatalogStore {
    state: Mutex<State>,
}

impl MemoryCatalogStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the store lock is poisoned.
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.records.len())
    }

    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the store lock is poisoned.
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn find_by_identity(
        &self,
        identity: &Identity,
    ) -> Result<Option<StoredRecord>, StoreError> {
        let state = self.lock()?;
        Ok(state.by_identity.get(identity).and_then(|id| {
            state.records.get(id).map(|record| StoredRecord {
                id: *id,
                record: record.clone(),
            })
        }))
    }

    async fn insert(&self, record: &CatalogRecord) -> Result<StoredId, StoreError> {
        let mut state = self.lock()?;
        if state.by_identity.contains_key(&record.identity) {
            return Err(StoreError::Duplicate {
                identity: record.identity.clone(),
            });
        }
        state.next_id += 1;
        let id = StoredId(state.next_id);
        state.by_identity.insert(record.identity.clone(), id);
        state.records.insert(id, record.clone());
        Ok(id)
    }

    async fn update(&self, id: StoredId, diff: &RecordDiff) -> Result<CatalogRecord, StoreError> {
        let mut state = self.lock()?;
        let stored = state.records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        *stored = diff.apply(stored);
        Ok(stored.clone())
    }

    async fn scan(&self, filter: &RecordFilter) -> Result<Vec<StoredRecord>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .records
            .iter()
            .filter(|(_, record)| filter.matches(record))
            .map(|(id, record)| StoredRecord {
                id: *id,
                record: record.clone(),
            })
            .collect())
    }

    async fn assign_category(&self, id: StoredId, category: &str) -> Result<bool, StoreError> {
        let mut state = self.lock()?;
        let stored = state.records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if stored.category.is_some() {
            return Ok(false);
        }
        stored.category = Some(category.to_string());
        Ok(true)
    }
}
