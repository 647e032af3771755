//! Column label normalization.
//!
//! Rewrites every column label into a storage-safe form: any character that
//! is not a letter, digit, or underscore becomes `_`, and the result is capped
//! at [`MAX_LABEL_LEN`] characters. Labels that collide after rewriting get a
//! numeric suffix so the column set stays unique. Normalizing an already
//! normalized dataset leaves it unchanged.

use std::collections::HashSet;

use crate::models::Dataset;

/// Maximum label length, in characters.
pub const MAX_LABEL_LEN: usize = 230;

/// Canonical form of a single label, without collision handling.
pub fn canonical_label(label: &str) -> String {
    label
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .take(MAX_LABEL_LEN)
        .collect()
}

/// Normalize all column labels in place. Row values are untouched.
pub fn normalize_columns(dataset: &mut Dataset) {
    let labels = normalized_labels(dataset.columns());
    *dataset.columns_mut() = labels;
}

fn normalized_labels(columns: &[String]) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::with_capacity(columns.len());
    let mut out = Vec::with_capacity(columns.len());

    for label in columns {
        let base = canonical_label(label);
        let unique = if taken.contains(&base) {
            disambiguate(&base, &taken)
        } else {
            base
        };
        taken.insert(unique.clone());
        out.push(unique);
    }

    out
}

fn disambiguate(base: &str, taken: &HashSet<String>) -> String {
    let mut n = 1usize;
    loop {
        let suffix = format!("_{}", n);
        let room = MAX_LABEL_LEN.saturating_sub(suffix.chars().count());
        let stem: String = base.chars().take(room).collect();
        let candidate = format!("{}{}", stem, suffix);
        if !taken.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
