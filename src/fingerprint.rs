//! Content fingerprints used as deduplication keys.
//!
//! The dataset is written as canonical CSV (header row, then one line per row,
//! `,` delimiter, `\n` terminator, RFC 4180 quoting) and hashed with SHA-256.
//! The hex digest is 64 characters wide. Row order and column order are part
//! of the content.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::models::Dataset;

/// Hex-encoded SHA-256 digest of a dataset's canonical serialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex characters, for display.
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical CSV bytes for a dataset.
pub fn canonical_csv(dataset: &Dataset) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b',')
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(dataset.columns())?;
    for row in dataset.rows() {
        writer.write_record(row.iter().map(|v| v.render()))?;
    }

    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

/// Compute the fingerprint of a dataset.
pub fn fingerprint(dataset: &Dataset) -> Result<Fingerprint, csv::Error> {
    let bytes = canonical_csv(dataset)?;
    Ok(fingerprint_bytes(&bytes))
}

/// SHA-256 of raw bytes as a [`Fingerprint`].
pub fn fingerprint_bytes(bytes: &[u8]) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    Fingerprint(format!("{:x}", hasher.finalize()))
}
