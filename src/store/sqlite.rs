//! SQLite-backed document store.
//!
//! Each dataset is one row of the `datasets` table: the fingerprint as the
//! primary key, the rows as a JSON array of `{column: value}` mappings, and
//! the column order alongside so the dataset can be rebuilt exactly.

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::{DatasetStore, InsertOutcome};
use crate::error::StoreError;
use crate::fingerprint::Fingerprint;
use crate::models::{Dataset, StoredRecord};

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Wrap an open pool. The schema must already exist (see [`crate::migrate`]).
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Release the pool at the end of a session.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Sum of `row_count` across all records.
    pub async fn total_rows(&self) -> Result<i64, StoreError> {
        let total: Option<i64> = sqlx::query_scalar("SELECT SUM(row_count) FROM datasets")
            .fetch_one(&self.pool)
            .await?;
        Ok(total.unwrap_or(0))
    }
}

fn record_from_row(row: &SqliteRow) -> Result<StoredRecord, StoreError> {
    let fingerprint: String = row.get("fingerprint");
    let columns_json: String = row.get("columns_json");
    let records_json: String = row.get("records_json");

    let corrupt = |reason: String| StoreError::Corrupt {
        fingerprint: fingerprint.clone(),
        reason,
    };

    let columns: Vec<String> =
        serde_json::from_str(&columns_json).map_err(|e| corrupt(e.to_string()))?;
    let records: Vec<serde_json::Value> =
        serde_json::from_str(&records_json).map_err(|e| corrupt(e.to_string()))?;
    let dataset = Dataset::from_records(columns, &records).map_err(|e| corrupt(e.to_string()))?;

    Ok(StoredRecord {
        fingerprint: fingerprint.clone(),
        dataset,
        inserted_at: row.get("inserted_at"),
    })
}

#[async_trait]
impl DatasetStore for SqliteStore {
    async fn exists(&self, fingerprint: &Fingerprint) -> Result<bool, StoreError> {
        let found: bool =
            sqlx::query_scalar("SELECT COUNT(*) > 0 FROM datasets WHERE fingerprint = ?")
                .bind(fingerprint.as_str())
                .fetch_one(&self.pool)
                .await?;
        Ok(found)
    }

    async fn insert_if_absent(
        &self,
        fingerprint: &Fingerprint,
        dataset: &Dataset,
    ) -> Result<InsertOutcome, StoreError> {
        let columns_json = serde_json::to_string(dataset.columns())?;
        let records_json = serde_json::to_string(&dataset.to_records())?;
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            INSERT INTO datasets (fingerprint, columns_json, records_json, row_count, inserted_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(fingerprint) DO NOTHING
            "#,
        )
        .bind(fingerprint.as_str())
        .bind(&columns_json)
        .bind(&records_json)
        .bind(dataset.num_rows() as i64)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(InsertOutcome {
            inserted: result.rows_affected() > 0,
        })
    }

    async fn list_all(&self) -> Result<Vec<StoredRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT fingerprint, columns_json, records_json, inserted_at FROM datasets ORDER BY inserted_at ASC, fingerprint ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(record_from_row).collect()
    }

    async fn get(&self, fingerprint: &str) -> Result<Option<StoredRecord>, StoreError> {
        let row = sqlx::query(
            "SELECT fingerprint, columns_json, records_json, inserted_at FROM datasets WHERE fingerprint = ?",
        )
        .bind(fingerprint)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(record_from_row).transpose()
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM datasets")
            .fetch_one(&self.pool)
            .await?;
        Ok(n as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::fingerprint;
    use crate::models::Value;
    use crate::{db, migrate};
    use tempfile::TempDir;

    async fn open(tmp: &TempDir) -> SqliteStore {
        let url = format!("sqlite:{}", tmp.path().join("store.sqlite").display());
        let pool = db::connect(&url).await.unwrap();
        migrate::run_migrations(&pool).await.unwrap();
        SqliteStore::new(pool)
    }

    fn sample() -> Dataset {
        Dataset::new(
            vec!["zeta".into(), "alpha".into()],
            vec![
                vec![Value::Number(1.5), Value::Text("x".into())],
                vec![Value::Null, Value::Text("y".into())],
            ],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn duplicate_insert_reports_already_present() {
        let tmp = TempDir::new().unwrap();
        let store = open(&tmp).await;
        let ds = sample();
        let fp = fingerprint(&ds).unwrap();

        assert!(!store.exists(&fp).await.unwrap());
        assert!(store.insert_if_absent(&fp, &ds).await.unwrap().inserted);
        assert!(!store.insert_if_absent(&fp, &ds).await.unwrap().inserted);
        assert!(store.exists(&fp).await.unwrap());
        assert_eq!(store.count().await.unwrap(), 1);
        assert_eq!(store.total_rows().await.unwrap(), 2);
        store.close().await;
    }

    #[tokio::test]
    async fn round_trips_column_order_and_nulls() {
        let tmp = TempDir::new().unwrap();
        let store = open(&tmp).await;
        let ds = sample();
        let fp = fingerprint(&ds).unwrap();
        store.insert_if_absent(&fp, &ds).await.unwrap();

        let fetched = store.get(fp.as_str()).await.unwrap().unwrap();
        assert_eq!(fetched.fingerprint, fp.as_str());
        assert_eq!(fetched.dataset, ds);

        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].dataset.columns(), ds.columns());
        store.close().await;
    }

    #[tokio::test]
    async fn missing_fingerprint_is_none() {
        let tmp = TempDir::new().unwrap();
        let store = open(&tmp).await;
        assert!(store.get("deadbeef").await.unwrap().is_none());
        assert_eq!(store.total_rows().await.unwrap(), 0);
        store.close().await;
    }
}
