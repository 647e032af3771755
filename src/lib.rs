//! # renalyser
//!
//! A dataset intake pipeline for research data.
//!
//! Uploaded CSV files are parsed, their column labels normalized, and the
//! resulting dataset fingerprinted. Two flows run on top of that prefix:
//! *validate* forwards a statistical summary to a hosted language model and
//! stores the original dataset; *clean* deduplicates and imputes, then stores
//! the cleaned dataset. A dataset is stored at most once per fingerprint.
//! PDF uploads are segmented into named sections and annotated with entities.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌────────────┐   ┌─────────────┐   ┌──────────┐
//! │  Upload  │──▶│ Normalize  │──▶│ Fingerprint │──▶│ Pipeline │
//! │ CSV/PDF  │   │  columns   │   │   SHA-256   │   │ validate │
//! └──────────┘   └────────────┘   └─────────────┘   │  clean   │
//!                                                   └────┬─────┘
//!                              ┌─────────────────────────┤
//!                              ▼                         ▼
//!                        ┌──────────┐              ┌──────────┐
//!                        │  Relay   │              │  SQLite  │
//!                        │  (LLM)   │              │  store   │
//!                        └──────────┘              └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration with environment overrides |
//! | [`models`] | Dataset, values, cleaning log, stored records |
//! | [`ingest`] | CSV and PDF upload parsing |
//! | [`normalize`] | Column label canonicalization |
//! | [`fingerprint`] | Content fingerprints |
//! | [`clean`] | Deduplication and imputation |
//! | [`summary`] | Descriptive statistics |
//! | [`relay`] | Validation relay to a chat-completion API |
//! | [`pipeline`] | Validate/clean orchestration |
//! | [`store`] | Dataset and section persistence |
//! | [`extract`] | PDF text extraction and section segmentation |
//! | [`entities`] | Entity tagging |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod clean;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod extract;
pub mod fingerprint;
pub mod ingest;
pub mod migrate;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod records;
pub mod relay;
pub mod sections_cmd;
pub mod session;
pub mod stats;
pub mod store;
pub mod summary;
pub mod task_cmd;
