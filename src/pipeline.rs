//! Pipeline orchestration for the two dataset flows.
//!
//! Both flows share a prefix:
//!
//! ```text
//! Uploaded → Normalized → Fingerprinted → Looked up (present | absent)
//! ```
//!
//! then diverge:
//!
//! - **validate**: the relay is called regardless of the lookup; if the
//!   fingerprint was absent, the *original* normalized dataset is inserted
//!   after the relay call.
//! - **clean**: the cleaning engine runs regardless of the lookup; if the
//!   fingerprint was absent, the *cleaned* dataset is inserted under the
//!   fingerprint of the uploaded dataset.
//!
//! Store failures never abort a flow. They are reported in the returned
//! [`Persistence`] value, and the validation text or cleaning result is
//! still produced. If the lookup itself fails, insertion is skipped because
//! it depends on the lookup's answer.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::clean::{clean_dataset, CleaningOutcome};
use crate::error::{PipelineError, StoreError};
use crate::fingerprint::{fingerprint, Fingerprint};
use crate::models::{CleaningLog, Dataset};
use crate::normalize::normalize_columns;
use crate::relay::{CompletionClient, ValidationOutcome, ValidationRelay};
use crate::store::DatasetStore;

/// Named flows accepted by [`Pipeline::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Validate,
    Clean,
}

impl Task {
    pub fn name(&self) -> &'static str {
        match self {
            Task::Validate => "validate",
            Task::Clean => "clean",
        }
    }
}

impl FromStr for Task {
    type Err = PipelineError;

    /// Accepts `validate` / `clean` and the long names `Validate Dataset` /
    /// `Clean Dataset`, ignoring case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "validate" | "validate dataset" => Ok(Task::Validate),
            "clean" | "clean dataset" => Ok(Task::Clean),
            _ => Err(PipelineError::UnknownTask(s.to_string())),
        }
    }
}

/// What happened at the persistence step.
#[derive(Debug, Clone, PartialEq)]
pub enum Persistence {
    Inserted,
    /// A record with this fingerprint already existed; nothing was written.
    AlreadyPresent,
    /// The store could not be reached; message is user-facing.
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct ValidateReport {
    pub fingerprint: Fingerprint,
    /// The normalized upload (what gets persisted).
    pub dataset: Dataset,
    pub outcome: ValidationOutcome,
    pub persistence: Persistence,
}

#[derive(Debug, Clone)]
pub struct CleanReport {
    pub fingerprint: Fingerprint,
    pub cleaned: Dataset,
    pub log: CleaningLog,
    pub persistence: Persistence,
}

#[derive(Debug, Clone)]
pub enum TaskReport {
    Validated(ValidateReport),
    Cleaned(CleanReport),
}

impl TaskReport {
    pub fn persistence(&self) -> &Persistence {
        match self {
            TaskReport::Validated(r) => &r.persistence,
            TaskReport::Cleaned(r) => &r.persistence,
        }
    }
}

/// Outcome of the shared lookup step.
enum Lookup {
    Absent,
    Present,
    Failed(String),
}

/// Orchestrator with injected store and completion client.
pub struct Pipeline {
    store: Arc<dyn DatasetStore>,
    relay: ValidationRelay,
    store_timeout: Duration,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn DatasetStore>,
        client: Arc<dyn CompletionClient>,
        relay_timeout: Duration,
        store_timeout: Duration,
    ) -> Self {
        Self {
            store,
            relay: ValidationRelay::new(client, relay_timeout),
            store_timeout,
        }
    }

    /// Dispatch by task name. Unknown names fail before any store access.
    pub async fn run(&self, task: &str, dataset: Dataset) -> Result<TaskReport, PipelineError> {
        let task: Task = task.parse()?;
        Ok(match task {
            Task::Validate => TaskReport::Validated(self.validate(dataset).await),
            Task::Clean => TaskReport::Cleaned(self.clean(dataset).await),
        })
    }

    /// Validate flow: relay the summary, persist the original if new.
    pub async fn validate(&self, dataset: Dataset) -> ValidateReport {
        let (dataset, fp, lookup) = self.prepare(dataset).await;

        let outcome = self.relay.validate(&dataset).await;
        if !outcome.is_success() {
            warn!(fingerprint = fp.short(), "validation failed; continuing with persistence");
        }

        let persistence = self.persist(&fp, &dataset, lookup).await;
        ValidateReport {
            fingerprint: fp,
            dataset,
            outcome,
            persistence,
        }
    }

    /// Clean flow: clean, persist the cleaned dataset if new.
    pub async fn clean(&self, dataset: Dataset) -> CleanReport {
        let (dataset, fp, lookup) = self.prepare(dataset).await;

        let CleaningOutcome { dataset: cleaned, log } = clean_dataset(dataset);
        info!(
            fingerprint = fp.short(),
            rows = cleaned.num_rows(),
            changes = log.len(),
            "dataset cleaned"
        );

        let persistence = self.persist(&fp, &cleaned, lookup).await;
        CleanReport {
            fingerprint: fp,
            cleaned,
            log,
            persistence,
        }
    }

    /// Normalize, fingerprint, look up.
    async fn prepare(&self, mut dataset: Dataset) -> (Dataset, Fingerprint, Lookup) {
        normalize_columns(&mut dataset);
        let fp = fingerprint_or_fallback(&dataset);

        let lookup = match self.with_timeout(self.store.exists(&fp)).await {
            Ok(true) => {
                info!(fingerprint = fp.short(), "dataset already stored; insertion will be skipped");
                Lookup::Present
            }
            Ok(false) => Lookup::Absent,
            Err(e) => {
                warn!(fingerprint = fp.short(), error = %e, "store lookup failed");
                Lookup::Failed(format!("store lookup failed: {}", e))
            }
        };

        (dataset, fp, lookup)
    }

    async fn persist(&self, fp: &Fingerprint, dataset: &Dataset, lookup: Lookup) -> Persistence {
        match lookup {
            Lookup::Present => Persistence::AlreadyPresent,
            Lookup::Failed(msg) => Persistence::Failed(msg),
            Lookup::Absent => {
                match self
                    .with_timeout(self.store.insert_if_absent(fp, dataset))
                    .await
                {
                    Ok(outcome) if outcome.inserted => {
                        info!(fingerprint = fp.short(), rows = dataset.num_rows(), "dataset stored");
                        Persistence::Inserted
                    }
                    // Another writer got there between lookup and insert.
                    Ok(_) => Persistence::AlreadyPresent,
                    Err(e) => {
                        warn!(fingerprint = fp.short(), error = %e, "store insert failed; dataset not persisted");
                        Persistence::Failed(format!("store insert failed: {}", e))
                    }
                }
            }
        }
    }

    async fn with_timeout<T, F>(&self, fut: F) -> Result<T, StoreError>
    where
        F: std::future::Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.store_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout {
                secs: self.store_timeout.as_secs(),
            }),
        }
    }
}

/// Writing CSV into memory cannot fail for well-formed strings; if it ever
/// does, hash the debug form so the flow still has a stable key.
fn fingerprint_or_fallback(dataset: &Dataset) -> Fingerprint {
    match fingerprint(dataset) {
        Ok(fp) => fp,
        Err(e) => {
            warn!(error = %e, "canonical CSV serialization failed; fingerprinting debug form");
            crate::fingerprint::fingerprint_bytes(format!("{:?}", dataset).as_bytes())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_task_names() {
        assert_eq!("validate".parse::<Task>().unwrap(), Task::Validate);
        assert_eq!("Clean Dataset".parse::<Task>().unwrap(), Task::Clean);
        assert_eq!("  CLEAN ".parse::<Task>().unwrap(), Task::Clean);

        let err = "Frobnicate".parse::<Task>().unwrap_err();
        assert!(matches!(err, PipelineError::UnknownTask(ref name) if name == "Frobnicate"));
        assert!(err.to_string().contains("Frobnicate"));
    }
}
