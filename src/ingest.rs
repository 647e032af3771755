//! Upload parsing: CSV into a [`Dataset`], PDF into document text.
//!
//! CSV cells are typed one at a time. Missing-value tokens become nulls,
//! finite numbers become numbers, and everything else stays text. Header
//! text is kept as written; blank header cells are named `Unnamed_<index>`.

use std::path::Path;

use crate::error::IngestError;
use crate::extract::{self, MIME_PDF};
use crate::models::{Dataset, Value};

/// Tokens read as missing values (compared after trimming).
const NA_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "null", "NULL", "None", "#N/A", "<NA>",
];

/// A parsed upload.
#[derive(Debug, Clone)]
pub enum Upload {
    Tabular(Dataset),
    Document { content_type: String, text: String },
}

/// Type a single CSV cell.
pub fn parse_cell(raw: &str) -> Value {
    let trimmed = raw.trim();
    if NA_TOKENS.contains(&trimmed) {
        return Value::Null;
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => Value::Number(n),
        _ => Value::Text(raw.to_string()),
    }
}

/// Parse CSV bytes (header row first) into a dataset.
pub fn parse_csv(bytes: &[u8]) -> Result<Dataset, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Err(IngestError::EmptyCsv);
    }
    let columns: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if h.trim().is_empty() {
                format!("Unnamed_{}", i)
            } else {
                h.to_string()
            }
        })
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(parse_cell).collect());
    }

    Ok(Dataset::new(columns, rows)?)
}

fn looks_like_pdf(path: &Path, bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF-")
        || path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

/// Read an uploaded file and parse it by kind.
pub fn load_upload(path: &Path) -> Result<Upload, IngestError> {
    let bytes = std::fs::read(path)?;
    if looks_like_pdf(path, &bytes) {
        let text = extract::extract_pdf_text(&bytes)?;
        return Ok(Upload::Document {
            content_type: MIME_PDF.to_string(),
            text,
        });
    }
    Ok(Upload::Tabular(parse_csv(&bytes)?))
}

/// Read an uploaded file that must be tabular.
pub fn load_dataset(path: &Path) -> Result<Dataset, IngestError> {
    match load_upload(path)? {
        Upload::Tabular(ds) => Ok(ds),
        Upload::Document { content_type, .. } => Err(IngestError::UnsupportedFormat(format!(
            "{} is {}, expected CSV",
            path.display(),
            content_type
        ))),
    }
}
