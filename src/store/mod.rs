//! Storage abstraction for fingerprinted datasets.
//!
//! The [`DatasetStore`] trait is the persistence gateway used by the
//! pipeline. Implementations:
//!
//! - [`sqlite::SqliteStore`]: the document store. Uniqueness is enforced by
//!   the table's primary key, so a duplicate insert is reported as
//!   "already present" rather than as an error.
//! - [`memory::InMemoryStore`]: a check-then-act store for tests and dry runs.
//!   Its single write lock makes the check and the insert one step.
//!
//! Every read returns an owned copy; callers never hold a reference into the
//! store.

pub mod memory;
pub mod sections;
pub mod sqlite;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::fingerprint::Fingerprint;
use crate::models::{Dataset, StoredRecord};

/// Result of [`DatasetStore::insert_if_absent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertOutcome {
    pub inserted: bool,
}

/// Persistence gateway for `{fingerprint, dataset}` records.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`exists`](DatasetStore::exists) | Is a record with this fingerprint stored? |
/// | [`insert_if_absent`](DatasetStore::insert_if_absent) | Store a record unless one already exists |
/// | [`list_all`](DatasetStore::list_all) | Every stored record |
/// | [`get`](DatasetStore::get) | One record by fingerprint |
/// | [`count`](DatasetStore::count) | Number of stored records |
#[async_trait]
pub trait DatasetStore: Send + Sync {
    async fn exists(&self, fingerprint: &Fingerprint) -> Result<bool, StoreError>;

    async fn insert_if_absent(
        &self,
        fingerprint: &Fingerprint,
        dataset: &Dataset,
    ) -> Result<InsertOutcome, StoreError>;

    /// All records. Order is unspecified.
    async fn list_all(&self) -> Result<Vec<StoredRecord>, StoreError>;

    async fn get(&self, fingerprint: &str) -> Result<Option<StoredRecord>, StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;
}
