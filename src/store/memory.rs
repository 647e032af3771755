//! In-memory [`DatasetStore`] for tests and dry runs.

use std::sync::RwLock;

use async_trait::async_trait;

use super::{DatasetStore, InsertOutcome};
use crate::error::StoreError;
use crate::fingerprint::Fingerprint;
use crate::models::{Dataset, StoredRecord};

pub struct InMemoryStore {
    records: RwLock<Vec<StoredRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatasetStore for InMemoryStore {
    async fn exists(&self, fingerprint: &Fingerprint) -> Result<bool, StoreError> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        Ok(records
            .iter()
            .any(|r| r.fingerprint == fingerprint.as_str()))
    }

    async fn insert_if_absent(
        &self,
        fingerprint: &Fingerprint,
        dataset: &Dataset,
    ) -> Result<InsertOutcome, StoreError> {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        if records.iter().any(|r| r.fingerprint == fingerprint.as_str()) {
            return Ok(InsertOutcome { inserted: false });
        }
        records.push(StoredRecord {
            fingerprint: fingerprint.to_string(),
            dataset: dataset.clone(),
            inserted_at: chrono::Utc::now().timestamp(),
        });
        Ok(InsertOutcome { inserted: true })
    }

    async fn list_all(&self) -> Result<Vec<StoredRecord>, StoreError> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        Ok(records.clone())
    }

    async fn get(&self, fingerprint: &str) -> Result<Option<StoredRecord>, StoreError> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        Ok(records.iter().find(|r| r.fingerprint == fingerprint).cloned())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        Ok(records.len() as u64)
    }
}
