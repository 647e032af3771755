use anyhow::Result;
use sqlx::SqlitePool;

/// Create the dataset document table and its indexes. Idempotent.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    // One row per fingerprint; the primary key is the dedup constraint.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS datasets (
            fingerprint TEXT PRIMARY KEY,
            columns_json TEXT NOT NULL,
            records_json TEXT NOT NULL,
            row_count INTEGER NOT NULL,
            inserted_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_datasets_inserted_at ON datasets(inserted_at DESC)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the PDF sections table if absent.
///
/// Called lazily by the section store before its first write.
pub async fn ensure_sections_table(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS document_sections (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            source TEXT NOT NULL,
            section TEXT NOT NULL,
            content TEXT NOT NULL,
            entities_json TEXT NOT NULL DEFAULT '[]',
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_sections_source ON document_sections(source)")
        .execute(pool)
        .await?;

    Ok(())
}
