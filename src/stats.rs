//! Store statistics and health overview.
//!
//! Gives a quick summary of what is stored: record count, stored rows,
//! PDF sections, and the on-disk size of the SQLite file. Used by `rnl stats`.

use anyhow::Result;

use crate::db::{self, sqlite_path};
use crate::session::Session;
use crate::store::sections::SectionStore;
use crate::store::DatasetStore;

/// Run the stats command: query the stores and print a summary.
pub async fn run_stats(session: &Session) -> Result<()> {
    let store = session.store();
    let url = session.config().store_url()?.to_string();

    let total_datasets = store.count().await?;
    let total_rows = store.total_rows().await?;
    let sections_url = session.config().sections_url()?.to_string();
    let sections = if sections_url == url {
        SectionStore::new(store.pool().clone()).count().await?
    } else {
        let sections_store = SectionStore::new(db::connect(&sections_url).await?);
        let n = sections_store.count().await?;
        sections_store.close().await;
        n
    };

    let db_size = std::fs::metadata(sqlite_path(&url))
        .map(|m| m.len())
        .unwrap_or(0);

    println!("renalyser store stats");
    println!("=====================");
    println!();
    println!("  Store:       {}", url);
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!("  Datasets:    {}", total_datasets);
    println!("  Rows:        {}", total_rows);
    println!("  Sections:    {}", sections);
    println!();

    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }
}
