//! End-to-end orchestration over in-memory fakes.
//!
//! One block named "first block" with one code of two print lines is
//! packaged, linked, submitted, polled to completion, and reported,
//! verifying the exact artifact bytes and submission payload.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sparkjob_core::transformation::{Block, Code};
use sparkjob_datamechanics::api::{ApiError, JobRequest, JobService};
use sparkjob_datamechanics::status::{AppResponse, JobState, JobStatus};
use sparkjob_runner::Orchestrator;
use sparkjob_storage::artifact::{ArtifactStore, StorageError};
use sparkjob_storage::link::ArtifactLink;

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

#[derive(Default)]
struct InMemoryStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

#[async_trait]
impl ArtifactStore for InMemoryStore {
    async fn put(&self, object_name: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        self.objects
            .lock()
            .unwrap()
            .insert(object_name.to_string(), bytes);
        Ok(())
    }

    async fn link(&self, object_name: &str) -> Result<ArtifactLink, StorageError> {
        Ok(ArtifactLink::bare(format!("s3://artifacts/{object_name}")))
    }
}

struct FakeJobService {
    submitted: Mutex<Vec<JobRequest>>,
    statuses: Mutex<VecDeque<AppResponse>>,
    logs_calls: AtomicU32,
}

impl FakeJobService {
    fn new(statuses: Vec<AppResponse>) -> Self {
        Self {
            submitted: Mutex::new(Vec::new()),
            statuses: Mutex::new(statuses.into()),
            logs_calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl JobService for FakeJobService {
    async fn submit(
        &self,
        request: &JobRequest,
    ) -> Result<serde_json::Map<String, serde_json::Value>, ApiError> {
        self.submitted.lock().unwrap().push(request.clone());
        let mut body = serde_json::Map::new();
        body.insert("appName".into(), request.app_name.clone().into());
        Ok(body)
    }

    async fn status(&self, _app_name: &str) -> Result<AppResponse, ApiError> {
        Ok(self
            .statuses
            .lock()
            .unwrap()
            .pop_front()
            .expect("test polled more often than scripted"))
    }

    async fn stream_logs(&self, _app_name: &str) -> Result<u64, ApiError> {
        self.logs_calls.fetch_add(1, Ordering::SeqCst);
        Ok(64)
    }
}

fn status(state: JobState, is_processed: bool) -> AppResponse {
    AppResponse {
        status: JobStatus {
            state,
            is_processed,
            started_at: None,
            ended_at: None,
        },
        metrics: None,
    }
}

fn completed_with_metrics() -> AppResponse {
    let mut metrics = serde_json::Map::new();
    metrics.insert("rowsRead".into(), 2.into());
    AppResponse {
        metrics: Some(metrics),
        ..status(JobState::Completed, true)
    }
}

fn hello_world_blocks() -> Vec<Block> {
    vec![Block {
        name: "first block".into(),
        codes: vec![Code {
            name: "first code".into(),
            script: vec![
                "print('hello world')\n".into(),
                "print('goodbye world')\n".into(),
            ],
        }],
    }]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn full_run_packages_submits_polls_and_reports() {
    let store = Arc::new(InMemoryStore::default());
    let service = Arc::new(FakeJobService::new(vec![
        status(JobState::Running, false),
        completed_with_metrics(),
    ]));

    let orchestrator = Orchestrator::new(
        Arc::clone(&store),
        Arc::clone(&service),
        Arc::clone(&service),
        "helloworld-7".into(),
        "transformation-test-7".into(),
        "default-template".into(),
    );

    let outcome = orchestrator
        .run(&hello_world_blocks())
        .await
        .expect("run should succeed");

    // Artifact: exact flat concatenation, under the derived name.
    let objects = store.objects.lock().unwrap();
    let artifact = objects
        .get("helloworld-7.py")
        .expect("artifact should be stored under <appName>.py");
    assert_eq!(
        String::from_utf8(artifact.clone()).unwrap(),
        "print('hello world')\nprint('goodbye world')\n"
    );

    // Submission payload references the same object.
    let submitted = service.submitted.lock().unwrap();
    assert_eq!(submitted.len(), 1);
    let request = &submitted[0];
    assert_eq!(request.app_name, "helloworld-7");
    assert_eq!(request.job_name, "transformation-test-7");
    assert_eq!(request.config_template_name, "default-template");
    assert_eq!(
        request.config_overrides["mainApplicationFile"],
        "s3://artifacts/helloworld-7.py"
    );

    // Poll loop ended on the processed snapshot, logs fetched once.
    assert!(outcome.status.is_processed);
    assert_eq!(outcome.status.state, JobState::Completed);
    assert_eq!(service.logs_calls.load(Ordering::SeqCst), 1);

    // Metrics survive to the outcome for the report.
    let metrics = outcome.metrics.expect("metrics should be present");
    assert_eq!(metrics["rowsRead"], 2);
}

#[tokio::test(start_paused = true)]
async fn preshared_token_overrides_reach_the_submission_payload() {
    struct TokenStore;

    #[async_trait]
    impl ArtifactStore for TokenStore {
        async fn put(&self, _object_name: &str, _bytes: Vec<u8>) -> Result<(), StorageError> {
            Ok(())
        }

        async fn link(&self, object_name: &str) -> Result<ArtifactLink, StorageError> {
            Ok(ArtifactLink {
                uri: format!("https://storage.example.com/artifacts/{object_name}"),
                config_overrides: vec![("storageAccessToken".into(), "sv=abc123".into())],
            })
        }
    }

    let service = Arc::new(FakeJobService::new(vec![status(JobState::Completed, true)]));
    let orchestrator = Orchestrator::new(
        TokenStore,
        Arc::clone(&service),
        Arc::clone(&service),
        "app-1".into(),
        "job-1".into(),
        "tpl".into(),
    );

    orchestrator
        .run(&hello_world_blocks())
        .await
        .expect("run should succeed");

    let submitted = service.submitted.lock().unwrap();
    let overrides = &submitted[0].config_overrides;
    assert_eq!(
        overrides["mainApplicationFile"],
        "https://storage.example.com/artifacts/app-1.py"
    );
    assert_eq!(overrides["storageAccessToken"], "sv=abc123");
}

#[tokio::test(start_paused = true)]
async fn storage_failure_aborts_before_submission() {
    struct FailingStore;

    #[async_trait]
    impl ArtifactStore for FailingStore {
        async fn put(&self, object_name: &str, _bytes: Vec<u8>) -> Result<(), StorageError> {
            Err(StorageError::Upload {
                object_name: object_name.to_string(),
                message: "quota exceeded".into(),
            })
        }

        async fn link(&self, _object_name: &str) -> Result<ArtifactLink, StorageError> {
            unreachable!("link must not be generated after a failed upload")
        }
    }

    let service = Arc::new(FakeJobService::new(vec![]));
    let orchestrator = Orchestrator::new(
        FailingStore,
        Arc::clone(&service),
        Arc::clone(&service),
        "app-1".into(),
        "job-1".into(),
        "tpl".into(),
    );

    let error = orchestrator
        .run(&hello_world_blocks())
        .await
        .expect_err("run should abort on storage failure");

    assert_eq!(error.exit_code(), 1);
    assert!(service.submitted.lock().unwrap().is_empty());
}
