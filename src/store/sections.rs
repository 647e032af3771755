//! Relational store for PDF sections with entity annotations.
//!
//! The `document_sections` table is created on first write. Sections are
//! written one statement at a time; there is no transaction across a
//! document, so a failure midway leaves the earlier sections in place and the
//! caller logs the partial state.

use sqlx::SqlitePool;
use tracing::warn;

use crate::entities::Entity;
use crate::error::StoreError;
use crate::extract::Section;
use crate::migrate;

/// A section together with its entity annotations.
#[derive(Debug, Clone)]
pub struct AnnotatedSection {
    pub section: Section,
    pub entities: Vec<Entity>,
}

pub struct SectionStore {
    pool: SqlitePool,
}

impl SectionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Insert every section for `source`. Returns the number written.
    pub async fn insert_sections(
        &self,
        source: &str,
        sections: &[AnnotatedSection],
    ) -> Result<usize, StoreError> {
        migrate::ensure_sections_table(&self.pool).await?;
        let now = chrono::Utc::now().timestamp();

        let mut written = 0usize;
        for item in sections {
            let entities_json = serde_json::to_string(&item.entities)?;
            let result = sqlx::query(
                "INSERT INTO document_sections (source, section, content, entities_json, created_at) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(source)
            .bind(&item.section.name)
            .bind(&item.section.content)
            .bind(&entities_json)
            .bind(now)
            .execute(&self.pool)
            .await;

            if let Err(e) = result {
                if written > 0 {
                    warn!(source, written, total = sections.len(), "partial section write; earlier sections remain stored");
                }
                return Err(e.into());
            }
            written += 1;
        }

        Ok(written)
    }

    /// Number of stored sections, or 0 if the table was never created.
    pub async fn count(&self) -> Result<i64, StoreError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='document_sections'",
        )
        .fetch_one(&self.pool)
        .await?;
        if !exists {
            return Ok(0);
        }
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM document_sections")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    /// `(section, content, entities_json)` rows for one source, in insertion order.
    pub async fn sections_for(
        &self,
        source: &str,
    ) -> Result<Vec<(String, String, String)>, StoreError> {
        migrate::ensure_sections_table(&self.pool).await?;
        let rows: Vec<(String, String, String)> = sqlx::query_as(
            "SELECT section, content, entities_json FROM document_sections WHERE source = ? ORDER BY id ASC",
        )
        .bind(source)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
