//! Error types for the dataset pipeline.
//!
//! Each stage owns a small `thiserror` enum. The CLI layer folds them into
//! `anyhow::Error`; the orchestrator converts transport and store failures
//! into inline report values instead of propagating them.

/// Configuration problems detected at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("required setting '{name}' is not configured (set {hint})")]
    Missing { name: String, hint: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Structural problems with a tabular dataset.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DatasetError {
    #[error("row {row} has {found} fields, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("record {row} is not a JSON object")]
    NotARecord { row: usize },
}

/// Failures while turning uploaded bytes into a dataset or document text.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("CSV parse failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV has no header row")]
    EmptyCsv,

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error("unsupported upload: {0}")]
    UnsupportedFormat(String),

    #[error("failed to read upload: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures reaching the remote text-completion service.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("completion provider is disabled")]
    Disabled,
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return TransportError::Request(format!("timed out: {}", err));
        }
        TransportError::Request(err.to_string())
    }
}

/// Failures talking to a storage back end.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Backend(#[from] sqlx::Error),

    #[error("store call timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("stored record {fingerprint} is corrupt: {reason}")]
    Corrupt { fingerprint: String, reason: String },

    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Orchestrator-level failures.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("unknown task '{0}'. Available: validate, clean")]
    UnknownTask(String),
}
