//! Cleaning engine: duplicate removal and missing-value imputation.
//!
//! Steps, in order:
//!
//! 1. Drop rows that are exactly equal to an earlier row (all columns). The
//!    number removed is always logged under [`REMOVED_DUPLICATES`].
//! 2. Numeric columns (every non-null value is a number): nulls are replaced
//!    with the mean of the remaining non-null values, computed after step 1.
//! 3. Other columns: nulls are replaced with [`UNKNOWN_SENTINEL`].
//!
//! A column that is entirely null has no mean and no type evidence. Its nulls
//! are left in place and the count is logged under
//! `Imputation Undefined (All Missing): <column>`. Columns without nulls do
//! not appear in the log. Nothing here aborts the whole dataset.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::models::{CleaningLog, Dataset, Value};

pub const REMOVED_DUPLICATES: &str = "Removed Duplicates";
pub const UNKNOWN_SENTINEL: &str = "Unknown";

/// Log key for nulls filled with a column mean.
pub fn numeric_fill_key(column: &str) -> String {
    format!("Filled Missing Values (Numeric): {}", column)
}

/// Log key for nulls filled with the sentinel string.
pub fn categorical_fill_key(column: &str) -> String {
    format!("Filled Missing Values (Categorical): {}", column)
}

/// Log key for all-null columns that could not be imputed.
pub fn undefined_key(column: &str) -> String {
    format!("Imputation Undefined (All Missing): {}", column)
}

/// Cleaned dataset plus the record of what changed.
#[derive(Debug, Clone)]
pub struct CleaningOutcome {
    pub dataset: Dataset,
    pub log: CleaningLog,
}

/// How a column's values are treated during imputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Categorical,
    /// No non-null values at all.
    Empty,
}

/// Classify a column by its non-null values.
pub fn column_kind(dataset: &Dataset, index: usize) -> ColumnKind {
    let mut saw_value = false;
    for value in dataset.column_values(index) {
        match value {
            Value::Null => {}
            Value::Number(_) => saw_value = true,
            Value::Text(_) => return ColumnKind::Categorical,
        }
    }
    if saw_value {
        ColumnKind::Numeric
    } else {
        ColumnKind::Empty
    }
}

/// Run the full cleaning pass.
pub fn clean_dataset(mut dataset: Dataset) -> CleaningOutcome {
    let mut log = CleaningLog::default();

    let removed = drop_duplicate_rows(&mut dataset);
    log.record(REMOVED_DUPLICATES, removed);
    debug!(removed, "dropped duplicate rows");

    for index in 0..dataset.num_columns() {
        let column = dataset.columns()[index].clone();
        let missing = dataset.column_values(index).filter(|v| v.is_null()).count();
        if missing == 0 {
            continue;
        }

        match column_kind(&dataset, index) {
            ColumnKind::Numeric => match column_mean(&dataset, index) {
                Some(mean) => {
                    fill_nulls(&mut dataset, index, Value::Number(mean));
                    log.record(numeric_fill_key(&column), missing);
                }
                None => {
                    warn!(column = %column, missing, "column mean is not finite, nulls left in place");
                    log.record(undefined_key(&column), missing);
                }
            },
            ColumnKind::Categorical => {
                fill_nulls(&mut dataset, index, Value::Text(UNKNOWN_SENTINEL.to_string()));
                log.record(categorical_fill_key(&column), missing);
            }
            ColumnKind::Empty => {
                warn!(column = %column, missing, "column has no values; mean is undefined, nulls left in place");
                log.record(undefined_key(&column), missing);
            }
        }
    }

    CleaningOutcome { dataset, log }
}

/// Remove rows equal to an earlier row, keeping first occurrences in order.
/// Returns the number of rows removed.
fn drop_duplicate_rows(dataset: &mut Dataset) -> usize {
    let before = dataset.num_rows();
    let mut seen: HashSet<Vec<RowKey>> = HashSet::with_capacity(before);
    dataset
        .rows_mut()
        .retain(|row| seen.insert(row.iter().map(RowKey::from).collect()));
    before - dataset.num_rows()
}

/// Hashable stand-in for a cell value.
#[derive(PartialEq, Eq, Hash)]
enum RowKey {
    Null,
    Number(u64),
    Text(String),
}

impl From<&Value> for RowKey {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => RowKey::Null,
            // -0.0 and 0.0 compare equal, so they must hash equal.
            Value::Number(n) if *n == 0.0 => RowKey::Number(0.0f64.to_bits()),
            Value::Number(n) => RowKey::Number(n.to_bits()),
            Value::Text(s) => RowKey::Text(s.clone()),
        }
    }
}

/// Running mean of a numeric column's non-null values.
///
/// `None` when the column has no numbers or the mean is not finite.
fn column_mean(dataset: &Dataset, index: usize) -> Option<f64> {
    let (mean, count) = dataset
        .column_values(index)
        .filter_map(Value::as_number)
        .fold((0.0f64, 0usize), |(m, k), x| {
            let k = k + 1;
            (m - m / k as f64 + x / k as f64, k)
        });
    (count > 0 && mean.is_finite()).then_some(mean)
}

fn fill_nulls(dataset: &mut Dataset, index: usize, fill: Value) {
    for row in dataset.rows_mut() {
        if row[index].is_null() {
            row[index] = fill.clone();
        }
    }
}
