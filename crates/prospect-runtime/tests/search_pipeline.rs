//! End-to-end orchestration against a scripted provider.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use tempfile::TempDir;

use prospect_connectors::{
    EnrichmentSpec, JobKind, JobStatus, ProviderApi, ProviderJob, SearchJobSpec,
};
use prospect_core::{BatchSettings, EntityKind, Error, Result};
use prospect_infer::EmbeddingGenerator;
use prospect_runtime::{
    EmbeddingPipeline, JobError, PollConfig, RetryPolicy, SearchOrchestrator,
};
use prospect_store::{EntityStore, SqliteStore};

/// Provider whose responses are scripted per call.
#[derive(Default)]
struct ScriptedProvider {
    create_failures: AtomicUsize,
    statuses: Mutex<VecDeque<Result<JobStatus>>>,
    items: Vec<serde_json::Value>,
    creates: AtomicUsize,
    status_checks: AtomicUsize,
    last_exclude: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    fn with_statuses(statuses: Vec<Result<JobStatus>>, items: Vec<serde_json::Value>) -> Self {
        Self {
            statuses: Mutex::new(statuses.into()),
            items,
            ..Self::default()
        }
    }

    fn next_status(&self) -> Result<JobStatus> {
        self.status_checks.fetch_add(1, Ordering::SeqCst);
        self.statuses
            .lock()
            .pop_front()
            .unwrap_or(Ok(JobStatus::Running))
    }
}

#[async_trait]
impl ProviderApi for ScriptedProvider {
    async fn create_search(&self, spec: &SearchJobSpec) -> Result<ProviderJob> {
        let n = self.creates.fetch_add(1, Ordering::SeqCst);
        if n < self.create_failures.load(Ordering::SeqCst) {
            return Err(Error::Http("connection reset".into()));
        }
        *self.last_exclude.lock() = spec.exclude.clone();
        Ok(ProviderJob {
            id: format!("ws_{}", n),
            kind: JobKind::Search,
            status: JobStatus::Pending,
            result_location: None,
        })
    }

    async fn get_job_status(&self, _job_id: &str) -> Result<JobStatus> {
        self.next_status()
    }

    async fn list_items(&self, _job_id: &str) -> Result<Vec<serde_json::Value>> {
        Ok(self.items.clone())
    }

    async fn create_enrichment(&self, _job_id: &str, _spec: &EnrichmentSpec) -> Result<ProviderJob> {
        Ok(ProviderJob {
            id: "enr_1".into(),
            kind: JobKind::Enrichment,
            status: JobStatus::Pending,
            result_location: None,
        })
    }

    async fn get_enrichment_status(&self, _job_id: &str, _enrichment_id: &str) -> Result<JobStatus> {
        self.next_status()
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

fn orchestrator(provider: Arc<ScriptedProvider>, max_attempts: u32) -> SearchOrchestrator {
    let poll = PollConfig {
        interval: Duration::from_millis(1),
        max_attempts,
        max_consecutive_errors: 5,
    };
    let retry = RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(1),
        multiplier: 2.0,
        max_delay: Duration::from_millis(5),
    };
    SearchOrchestrator::new(provider, poll, retry)
}

fn companies(n: usize) -> Vec<serde_json::Value> {
    let profiles = [
        ("Acme Freight", "Trucking logistics"),
        ("Globex Shipping", "Ocean containers"),
        ("Initech Robotics", "Warehouse automation"),
    ];
    profiles
        .iter()
        .cycle()
        .take(n)
        .enumerate()
        .map(|(i, (name, industry))| {
            json!({"id": format!("item_{}", i), "name": name, "industry": industry})
        })
        .collect()
}

#[tokio::test]
async fn search_completes_after_active_statuses() {
    let provider = Arc::new(ScriptedProvider::with_statuses(
        vec![
            Ok(JobStatus::Pending),
            Ok(JobStatus::Running),
            Err(Error::Http("502".into())),
            Ok(JobStatus::Idle),
        ],
        companies(3),
    ));
    let orch = orchestrator(provider.clone(), 10);
    let spec = SearchJobSpec::new("logistics", 3, EntityKind::Company).with_min_results(2);

    let results = orch.create_and_await(&spec).await.unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results.kind, JobKind::Search);
    assert!(results.warning.is_none());
    assert_eq!(provider.status_checks.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn fewer_than_minimum_is_a_warning() {
    let provider = Arc::new(ScriptedProvider::with_statuses(
        vec![Ok(JobStatus::Completed)],
        companies(2),
    ));
    let spec = SearchJobSpec::new("logistics", 10, EntityKind::Company).with_min_results(5);
    let results = orchestrator(provider, 5).create_and_await(&spec).await.unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.warning.unwrap().contains("Only 2 results"));
}

#[tokio::test]
async fn empty_completed_job_is_zero_results() {
    let provider = Arc::new(ScriptedProvider::with_statuses(
        vec![Ok(JobStatus::Idle)],
        Vec::new(),
    ));
    let orch = orchestrator(provider.clone(), 5);
    let spec = SearchJobSpec::new("nothing matches", 10, EntityKind::Company);
    let err = orch.create_and_await_with_retry(&spec).await.unwrap_err();
    assert!(err.to_string().contains("0 results"));
    assert!(matches!(err, JobError::ZeroResults { .. }));
    // Zero results are not retried.
    assert_eq!(provider.creates.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn paused_job_is_terminal() {
    let provider = Arc::new(ScriptedProvider::with_statuses(
        vec![Ok(JobStatus::Running), Ok(JobStatus::Paused)],
        companies(1),
    ));
    let orch = orchestrator(provider.clone(), 10);
    let spec = SearchJobSpec::new("x", 1, EntityKind::Company);
    let err = orch.create_and_await_with_retry(&spec).await.unwrap_err();
    assert!(matches!(err, JobError::ProviderFailure(ref r) if r.contains("paused")));
    assert_eq!(provider.creates.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn never_finishing_job_times_out() {
    let provider = Arc::new(ScriptedProvider::with_statuses(Vec::new(), companies(1)));
    let orch = orchestrator(provider.clone(), 4);
    let spec = SearchJobSpec::new("x", 1, EntityKind::Company);
    let err = orch.create_and_await(&spec).await.unwrap_err();
    assert!(matches!(err, JobError::Timeout { attempts: 4, .. }));
    assert_eq!(provider.status_checks.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn submission_errors_are_retried() {
    let provider = Arc::new(ScriptedProvider::with_statuses(
        vec![Ok(JobStatus::Idle)],
        companies(1),
    ));
    provider.create_failures.store(2, Ordering::SeqCst);
    let orch = orchestrator(provider.clone(), 5);
    let spec = SearchJobSpec::new("x", 1, EntityKind::Company);

    let results = orch.create_and_await_with_retry(&spec).await.unwrap();
    assert_eq!(results.job_id, "ws_2");
    assert_eq!(provider.creates.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn submission_retry_exhaustion() {
    let provider = Arc::new(ScriptedProvider::default());
    provider.create_failures.store(10, Ordering::SeqCst);
    let orch = orchestrator(provider.clone(), 5);
    let spec = SearchJobSpec::new("x", 1, EntityKind::Company);

    let err = orch.create_and_await_with_retry(&spec).await.unwrap_err();
    assert!(matches!(err, JobError::RetriesExhausted { attempts: 3, .. }));
    assert_eq!(provider.creates.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn unstable_polling_does_not_resubmit() {
    let provider = Arc::new(ScriptedProvider::with_statuses(
        (0..5).map(|_| Err(Error::Http("connection reset".into()))).collect(),
        companies(1),
    ));
    let orch = orchestrator(provider.clone(), 20);
    let spec = SearchJobSpec::new("x", 1, EntityKind::Company);

    let err = orch.create_and_await_with_retry(&spec).await.unwrap_err();
    assert!(matches!(err, JobError::TooManyTransientErrors { count: 5, .. }));
    assert_eq!(provider.creates.load(Ordering::SeqCst), 1);
    assert_eq!(provider.status_checks.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn enrichment_polls_until_completed() {
    let provider = Arc::new(ScriptedProvider::with_statuses(
        vec![Ok(JobStatus::Pending), Ok(JobStatus::Completed)],
        companies(2),
    ));
    let orch = orchestrator(provider, 5);
    let results = orch
        .enrich_and_await("ws_0", &EnrichmentSpec::new("Latest funding round"))
        .await
        .unwrap();
    assert_eq!(results.kind, JobKind::Enrichment);
    assert_eq!(results.job_id, "ws_0");
    assert_eq!(results.len(), 2);
}

#[tokio::test]
async fn canceled_enrichment_is_terminal() {
    let provider = Arc::new(ScriptedProvider::with_statuses(
        vec![Ok(JobStatus::Canceled)],
        companies(2),
    ));
    let err = orchestrator(provider, 5)
        .enrich_and_await("ws_0", &EnrichmentSpec::new("CEO name"))
        .await
        .unwrap_err();
    assert!(matches!(err, JobError::ProviderFailure(_)));
}

#[tokio::test]
async fn search_results_become_embedded_entities() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(SqliteStore::open(dir.path(), 64).unwrap());
    let pipeline = EmbeddingPipeline::new(
        store.clone(),
        Arc::new(EmbeddingGenerator::fallback_only(64)),
        BatchSettings {
            batch_size: 2,
            delay_ms: 1,
        },
    );

    let provider = Arc::new(ScriptedProvider::with_statuses(
        vec![Ok(JobStatus::Idle), Ok(JobStatus::Idle)],
        companies(3),
    ));
    let orch = orchestrator(provider.clone(), 5);

    let spec = SearchJobSpec::new("logistics", 3, EntityKind::Company);
    let results = orch.create_and_await(&spec).await.unwrap();
    let report = pipeline
        .materialize(&results, EntityKind::Company)
        .await
        .unwrap();
    assert_eq!(report.regenerated, 3);

    // A follow-up search excludes what is already stored.
    let known = store.known_external_ids(EntityKind::Company).unwrap();
    let spec = SearchJobSpec::new("logistics", 3, EntityKind::Company).with_exclude(known);
    orch.create_and_await(&spec).await.unwrap();
    assert_eq!(provider.last_exclude.lock().len(), 3);

    let query = store.get_entity("item_1").unwrap().unwrap().embedding.unwrap();
    let hits = store.find_similar(&query, Some(EntityKind::Company), 1).unwrap();
    assert_eq!(hits[0].entity_id, "item_1");
}
