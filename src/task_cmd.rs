//! CLI entry points for the dataset flows.
//!
//! Loads the upload, runs it through the [`Pipeline`](crate::pipeline::Pipeline),
//! and prints the report. Validation failures and store failures are printed
//! inline; they do not change the exit status.

use std::path::Path;

use anyhow::Result;

use crate::ingest;
use crate::normalize::normalize_columns;
use crate::pipeline::{CleanReport, Persistence, Task, TaskReport, ValidateReport};
use crate::records::render_table;
use crate::relay::build_prompt;
use crate::session::Session;
use crate::summary::describe;

/// Rows shown when previewing a dataset.
const PREVIEW_ROWS: usize = 10;

/// Run a named task against an uploaded CSV.
///
/// The task name is checked before the file is read or the store touched.
pub async fn run_task(session: &Session, task: &str, path: &Path) -> Result<()> {
    let task: Task = task.parse()?;
    let pipeline = session.pipeline()?;
    let dataset = ingest::load_dataset(path)?;

    let report = pipeline.run(task.name(), dataset).await?;
    match &report {
        TaskReport::Validated(r) => print_validate(r),
        TaskReport::Cleaned(r) => print_clean(r)?,
    }
    Ok(())
}

/// Print the summary and prompt for an upload without calling the relay.
pub fn run_describe(path: &Path, show_prompt: bool) -> Result<()> {
    let mut dataset = ingest::load_dataset(path)?;
    normalize_columns(&mut dataset);

    if show_prompt {
        println!("{}", build_prompt(&dataset));
    } else {
        println!("{}", describe(&dataset).to_json_string());
    }
    Ok(())
}

fn print_persistence(persistence: &Persistence, inserted_msg: &str) {
    match persistence {
        Persistence::Inserted => println!("{}", inserted_msg),
        Persistence::AlreadyPresent => println!(
            "This dataset has already been added to the store. Skipping insertion."
        ),
        Persistence::Failed(msg) => println!("Warning: dataset not saved: {}", msg),
    }
}

fn print_validate(report: &ValidateReport) {
    println!("validate {}", report.fingerprint.short());
    println!(
        "  rows: {}  columns: {}",
        report.dataset.num_rows(),
        report.dataset.num_columns()
    );
    println!();
    println!("--- Validation Result ---");
    println!("{}", report.outcome.message());
    println!();
    print_persistence(
        &report.persistence,
        "Dataset validated and saved to the store.",
    );
}

fn print_clean(report: &CleanReport) -> Result<()> {
    println!("clean {}", report.fingerprint.short());
    println!();
    println!(
        "--- Cleaned Dataset ({} rows, showing up to {}) ---",
        report.cleaned.num_rows(),
        PREVIEW_ROWS
    );
    print!("{}", render_table(&report.cleaned, PREVIEW_ROWS));
    println!();
    println!("--- Cleaning Details ---");
    println!("{}", serde_json::to_string_pretty(&report.log)?);
    println!();
    print_persistence(&report.persistence, "Cleaned dataset saved to the store.");
    Ok(())
}
