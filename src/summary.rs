//! Descriptive statistics for the validation prompt.
//!
//! Numeric columns get count, mean, sample standard deviation, min, the three
//! quartiles, and max. Quartiles use linear interpolation between the two
//! closest ranks. When a dataset has no numeric column, its categorical
//! columns are described instead (count, unique, top, freq).

use std::collections::HashMap;

use serde::Serialize;

use crate::clean::{column_kind, ColumnKind};
use crate::models::{Dataset, Value};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    pub count: usize,
    pub mean: f64,
    /// Absent when fewer than two values are present.
    pub std: Option<f64>,
    pub min: f64,
    #[serde(rename = "25%")]
    pub q25: f64,
    #[serde(rename = "50%")]
    pub q50: f64,
    #[serde(rename = "75%")]
    pub q75: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoricalSummary {
    pub count: usize,
    pub unique: usize,
    pub top: Option<String>,
    pub freq: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ColumnSummary {
    Numeric(NumericSummary),
    Categorical(CategoricalSummary),
}

/// Per-column summaries in dataset column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DatasetSummary {
    pub columns: Vec<(String, ColumnSummary)>,
}

impl DatasetSummary {
    pub fn get(&self, column: &str) -> Option<&ColumnSummary> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, s)| s)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Pretty JSON object keyed by column, in column order.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

impl Serialize for DatasetSummary {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, summary) in &self.columns {
            map.serialize_entry(name, summary)?;
        }
        map.end()
    }
}

/// Describe a dataset.
pub fn describe(dataset: &Dataset) -> DatasetSummary {
    let numeric: Vec<usize> = (0..dataset.num_columns())
        .filter(|&i| column_kind(dataset, i) == ColumnKind::Numeric)
        .collect();

    let columns = if numeric.is_empty() {
        (0..dataset.num_columns())
            .map(|i| {
                (
                    dataset.columns()[i].clone(),
                    ColumnSummary::Categorical(describe_categorical(dataset, i)),
                )
            })
            .collect()
    } else {
        numeric
            .into_iter()
            .filter_map(|i| {
                describe_numeric(dataset, i)
                    .map(|s| (dataset.columns()[i].clone(), ColumnSummary::Numeric(s)))
            })
            .collect()
    };

    DatasetSummary { columns }
}

fn describe_numeric(dataset: &Dataset, index: usize) -> Option<NumericSummary> {
    let mut values: Vec<f64> = dataset
        .column_values(index)
        .filter_map(Value::as_number)
        .collect();
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));

    let count = values.len();
    let mean = values.iter().sum::<f64>() / count as f64;
    let std = if count > 1 {
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
        Some(var.sqrt())
    } else {
        None
    };

    Some(NumericSummary {
        count,
        mean,
        std,
        min: values[0],
        q25: quantile(&values, 0.25),
        q50: quantile(&values, 0.50),
        q75: quantile(&values, 0.75),
        max: values[count - 1],
    })
}

/// Linear-interpolation quantile over sorted, non-empty input.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

fn describe_categorical(dataset: &Dataset, index: usize) -> CategoricalSummary {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut order: Vec<String> = Vec::new();
    let mut count = 0usize;

    for value in dataset.column_values(index) {
        if value.is_null() {
            continue;
        }
        count += 1;
        let key = value.render();
        let entry = counts.entry(key.clone()).or_insert(0);
        if *entry == 0 {
            order.push(key);
        }
        *entry += 1;
    }

    // Ties go to the value seen first.
    let mut top: Option<(&String, usize)> = None;
    for key in &order {
        let n = counts[key];
        if top.map_or(true, |(_, best)| n > best) {
            top = Some((key, n));
        }
    }

    CategoricalSummary {
        count,
        unique: order.len(),
        top: top.map(|(k, _)| k.clone()),
        freq: top.map_or(0, |(_, n)| n),
    }
}
