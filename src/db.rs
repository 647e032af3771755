use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

/// Open a SQLite pool for a connection string such as `sqlite:./data/renalyser.sqlite`.
///
/// A bare path is accepted too. The parent directory is created if needed.
pub async fn connect(url: &str) -> Result<SqlitePool> {
    let url = if url.starts_with("sqlite:") {
        url.to_string()
    } else {
        format!("sqlite:{}", url)
    };

    // Ensure parent directory exists
    let path = sqlite_path(&url);
    if !path.is_empty() && path != ":memory:" {
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create store directory: {}", parent.display())
                })?;
            }
        }
    }

    let options = SqliteConnectOptions::from_str(&url)
        .with_context(|| format!("Invalid store URL: {}", url))?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open store: {}", url))?;

    Ok(pool)
}

/// File path portion of a `sqlite:` URL.
pub fn sqlite_path(url: &str) -> &str {
    url.trim_start_matches("sqlite:")
        .trim_start_matches("//")
        .split('?')
        .next()
        .unwrap_or_default()
}
