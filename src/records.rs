//! Stored dataset listing and retrieval.
//!
//! Backs the `rnl list` and `rnl show` commands. Every read goes through the
//! [`DatasetStore`] trait and yields a fresh copy of the stored dataset.

use anyhow::{bail, Result};

use crate::models::{Dataset, StoredRecord};
use crate::store::DatasetStore;

/// Rows shown per record by `rnl list`.
const LIST_PREVIEW_ROWS: usize = 2;
/// Widest cell rendered before truncation.
const MAX_CELL_WIDTH: usize = 24;

/// Render up to `limit` rows as an aligned text table.
pub fn render_table(dataset: &Dataset, limit: usize) -> String {
    let header: Vec<String> = dataset.columns().iter().map(|c| clip(c)).collect();
    let body: Vec<Vec<String>> = dataset
        .rows()
        .iter()
        .take(limit)
        .map(|row| row.iter().map(|v| clip(&v.to_string())).collect())
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in &body {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, &header, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_line(&mut out, &rule, &widths);
    for row in &body {
        push_line(&mut out, row, &widths);
    }
    out
}

fn clip(s: &str) -> String {
    if s.chars().count() <= MAX_CELL_WIDTH {
        return s.to_string();
    }
    let mut clipped: String = s.chars().take(MAX_CELL_WIDTH - 1).collect();
    clipped.push('…');
    clipped
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(c, w)| format!("{:<width$}", c, width = *w))
        .collect();
    out.push_str("  ");
    out.push_str(padded.join("  ").trim_end());
    out.push('\n');
}

/// CLI entry point for `rnl list`.
pub async fn run_list(store: &dyn DatasetStore) -> Result<()> {
    let records = store.list_all().await?;
    if records.is_empty() {
        println!("No datasets found in the store.");
        return Ok(());
    }

    for (i, record) in records.iter().enumerate() {
        println!("--- Dataset {} ---", i + 1);
        println!("fingerprint:  {}", record.fingerprint);
        println!(
            "shape:        {} rows × {} columns",
            record.dataset.num_rows(),
            record.dataset.num_columns()
        );
        println!("inserted_at:  {}", format_ts_iso(record.inserted_at));
        println!("preview (first {} rows):", LIST_PREVIEW_ROWS);
        print!("{}", render_table(&record.dataset, LIST_PREVIEW_ROWS));
        println!();
    }

    Ok(())
}

/// CLI entry point for `rnl show`. Accepts a full fingerprint or a unique prefix.
pub async fn run_show(store: &dyn DatasetStore, fingerprint: &str) -> Result<()> {
    let record = find_record(store, fingerprint).await?;

    println!("--- Dataset ---");
    println!("fingerprint:  {}", record.fingerprint);
    println!("inserted_at:  {}", format_ts_iso(record.inserted_at));
    println!("rows:         {}", record.dataset.num_rows());
    println!();
    print!("{}", render_table(&record.dataset, usize::MAX));

    Ok(())
}

/// Resolve a full fingerprint or a unique, non-empty prefix.
async fn find_record(store: &dyn DatasetStore, fingerprint: &str) -> Result<StoredRecord> {
    let fingerprint = fingerprint.trim();
    if fingerprint.is_empty() {
        bail!("fingerprint must not be empty");
    }

    let record = match store.get(fingerprint).await? {
        Some(r) => r,
        None => {
            let mut matches: Vec<_> = store
                .list_all()
                .await?
                .into_iter()
                .filter(|r| r.fingerprint.starts_with(fingerprint))
                .collect();
            match matches.len() {
                0 => bail!("dataset not found: {}", fingerprint),
                1 => matches.remove(0),
                n => bail!("fingerprint prefix '{}' is ambiguous ({} matches)", fingerprint, n),
            }
        }
    };
    Ok(record)
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| ts.to_string())
}
