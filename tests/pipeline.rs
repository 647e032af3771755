use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use renalyser::clean::{numeric_fill_key, REMOVED_DUPLICATES};
use renalyser::error::{PipelineError, StoreError, TransportError};
use renalyser::fingerprint::{fingerprint, Fingerprint};
use renalyser::models::{Dataset, StoredRecord, Value};
use renalyser::pipeline::{Persistence, Pipeline, TaskReport};
use renalyser::relay::{CompletionClient, ValidationOutcome, VALIDATION_ERROR_PREFIX};
use renalyser::store::memory::InMemoryStore;
use renalyser::store::{DatasetStore, InsertOutcome};

struct CannedClient {
    reply: Result<String, String>,
    prompts: Mutex<Vec<String>>,
}

impl CannedClient {
    fn ok(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn failing(msg: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(msg.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionClient for CannedClient {
    fn model_name(&self) -> &str {
        "canned"
    }

    async fn complete(&self, prompt: &str) -> Result<String, TransportError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone().map_err(TransportError::Request)
    }
}

/// Store whose every call fails, counting attempts.
#[derive(Default)]
struct BrokenStore {
    calls: AtomicUsize,
}

impl BrokenStore {
    fn down(&self) -> StoreError {
        self.calls.fetch_add(1, Ordering::SeqCst);
        StoreError::Timeout { secs: 1 }
    }
}

#[async_trait]
impl DatasetStore for BrokenStore {
    async fn exists(&self, _fingerprint: &Fingerprint) -> Result<bool, StoreError> {
        Err(self.down())
    }

    async fn insert_if_absent(
        &self,
        _fingerprint: &Fingerprint,
        _dataset: &Dataset,
    ) -> Result<InsertOutcome, StoreError> {
        Err(self.down())
    }

    async fn list_all(&self) -> Result<Vec<StoredRecord>, StoreError> {
        Err(self.down())
    }

    async fn get(&self, _fingerprint: &str) -> Result<Option<StoredRecord>, StoreError> {
        Err(self.down())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Err(self.down())
    }
}

fn pipeline(store: Arc<dyn DatasetStore>, client: Arc<dyn CompletionClient>) -> Pipeline {
    Pipeline::new(store, client, Duration::from_secs(5), Duration::from_secs(5))
}

/// Two identical rows, one missing number; column labels need normalizing.
fn upload() -> Dataset {
    Dataset::new(
        vec!["sample id".into(), "dose (mg)".into()],
        vec![
            vec![Value::Text("s1".into()), Value::Number(10.0)],
            vec![Value::Text("s1".into()), Value::Number(10.0)],
            vec![Value::Text("s2".into()), Value::Null],
            vec![Value::Text("s3".into()), Value::Number(40.0)],
        ],
    )
    .unwrap()
}

#[tokio::test]
async fn validate_persists_normalized_original() {
    let store = Arc::new(InMemoryStore::new());
    let client = CannedClient::ok("Looks consistent.");
    let p = pipeline(store.clone(), client.clone());

    let report = p.validate(upload()).await;
    assert_eq!(
        report.outcome,
        ValidationOutcome::Insights("Looks consistent.".into())
    );
    assert_eq!(report.persistence, Persistence::Inserted);
    assert_eq!(client.calls(), 1);

    let stored = store.get(report.fingerprint.as_str()).await.unwrap().unwrap();
    assert_eq!(stored.dataset.columns(), &["sample_id", "dose__mg_"]);
    assert_eq!(stored.dataset.num_rows(), 4);
    assert_eq!(stored.dataset, report.dataset);
}

#[tokio::test]
async fn clean_persists_cleaned_under_upload_fingerprint() {
    let store = Arc::new(InMemoryStore::new());
    let p = pipeline(store.clone(), CannedClient::ok("unused"));

    let report = p.clean(upload()).await;
    assert_eq!(report.persistence, Persistence::Inserted);
    assert_eq!(report.log.get(REMOVED_DUPLICATES), Some(1));
    assert_eq!(report.log.get(&numeric_fill_key("dose__mg_")), Some(1));
    assert_eq!(report.cleaned.num_rows(), 3);

    let mut normalized = upload();
    renalyser::normalize::normalize_columns(&mut normalized);
    let expected_fp = fingerprint(&normalized).unwrap();
    assert_eq!(report.fingerprint, expected_fp);

    let stored = store.get(expected_fp.as_str()).await.unwrap().unwrap();
    assert_eq!(stored.dataset, report.cleaned);
    assert!(stored
        .dataset
        .column_values(1)
        .all(|v| !v.is_null()));
}

#[tokio::test]
async fn second_upload_is_not_stored_twice() {
    let store = Arc::new(InMemoryStore::new());
    let client = CannedClient::ok("fine");
    let p = pipeline(store.clone(), client.clone());

    assert_eq!(p.clean(upload()).await.persistence, Persistence::Inserted);
    assert_eq!(
        p.clean(upload()).await.persistence,
        Persistence::AlreadyPresent
    );

    // Validate still calls the relay when the dataset is already stored.
    let report = p.validate(upload()).await;
    assert_eq!(report.persistence, Persistence::AlreadyPresent);
    assert!(report.outcome.is_success());
    assert_eq!(client.calls(), 1);
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn relay_failure_is_inline_and_dataset_still_stored() {
    let store = Arc::new(InMemoryStore::new());
    let p = pipeline(store.clone(), CannedClient::failing("connection refused"));

    let report = p.validate(upload()).await;
    assert!(!report.outcome.is_success());
    assert!(report.outcome.message().starts_with(VALIDATION_ERROR_PREFIX));
    assert!(report.outcome.message().contains("connection refused"));
    assert_eq!(report.persistence, Persistence::Inserted);
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn store_failure_still_produces_results() {
    let store = Arc::new(BrokenStore::default());
    let p = pipeline(store.clone(), CannedClient::ok("ok"));

    let cleaned = p.clean(upload()).await;
    assert!(matches!(cleaned.persistence, Persistence::Failed(_)));
    assert_eq!(cleaned.cleaned.num_rows(), 3);

    let validated = p.validate(upload()).await;
    assert!(matches!(validated.persistence, Persistence::Failed(_)));
    assert!(validated.outcome.is_success());

    // Lookup failed, so no insert was attempted.
    assert_eq!(store.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn unknown_task_touches_nothing() {
    let store = Arc::new(BrokenStore::default());
    let client = CannedClient::ok("ok");
    let p = pipeline(store.clone(), client.clone());

    let err = p.run("Frobnicate", upload()).await.unwrap_err();
    assert!(matches!(&err, PipelineError::UnknownTask(name) if name == "Frobnicate"));
    assert!(err.to_string().contains("Frobnicate"));
    assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn run_dispatches_by_display_name() {
    let store = Arc::new(InMemoryStore::new());
    let p = pipeline(store, CannedClient::ok("ok"));

    let report = p.run("Clean Dataset", upload()).await.unwrap();
    assert!(matches!(report, TaskReport::Cleaned(_)));
    let report = p.run(" validate ", upload()).await.unwrap();
    assert!(matches!(report, TaskReport::Validated(_)));
    assert_eq!(report.persistence(), &Persistence::AlreadyPresent);
}

/// Store whose lookups never answer in time.
struct StalledStore;

#[async_trait]
impl DatasetStore for StalledStore {
    async fn exists(&self, _fingerprint: &Fingerprint) -> Result<bool, StoreError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(false)
    }

    async fn insert_if_absent(
        &self,
        _fingerprint: &Fingerprint,
        _dataset: &Dataset,
    ) -> Result<InsertOutcome, StoreError> {
        Ok(InsertOutcome { inserted: true })
    }

    async fn list_all(&self) -> Result<Vec<StoredRecord>, StoreError> {
        Ok(Vec::new())
    }

    async fn get(&self, _fingerprint: &str) -> Result<Option<StoredRecord>, StoreError> {
        Ok(None)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(0)
    }
}

#[tokio::test(start_paused = true)]
async fn slow_store_lookup_times_out_inline() {
    let client = CannedClient::ok("ok");
    let p = Pipeline::new(
        Arc::new(StalledStore),
        client.clone(),
        Duration::from_secs(5),
        Duration::from_secs(2),
    );

    let cleaned = p.clean(upload()).await;
    assert_eq!(
        cleaned.persistence,
        Persistence::Failed("store lookup failed: store call timed out after 2s".into())
    );
    assert_eq!(cleaned.cleaned.num_rows(), 3);

    let validated = p.validate(upload()).await;
    assert!(validated.outcome.is_success());
    assert_eq!(
        validated.persistence,
        Persistence::Failed("store lookup failed: store call timed out after 2s".into())
    );
    assert_eq!(client.calls(), 1);
}
