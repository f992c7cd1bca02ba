//! The job-lifecycle orchestrator.
//!
//! Owns one run: packages the script artifact, generates its access
//! link, submits the job, polls to completion, and reports. Each run
//! owns its own app name, job name, and client instances; nothing is
//! shared across invocations.

use sparkjob_core::error::RunError;
use sparkjob_core::transformation::{assemble_script, Block};
use sparkjob_datamechanics::api::{JobRequest, JobService};
use sparkjob_storage::artifact::ArtifactStore;
use tokio_util::sync::CancellationToken;

use crate::poller::{poll_until_processed, JobOutcome, PollerConfig};
use crate::report::render_report;

/// Orchestrates one job run against an artifact store and job service.
///
/// `submitter` and `poll_service` are usually two instances of the
/// same client sharing a connection pool, differing only in whether
/// transport logging is enabled — polling stays quiet by design.
pub struct Orchestrator<S, J> {
    store: S,
    submitter: J,
    poll_service: J,
    app_name: String,
    job_name: String,
    configuration_template: String,
    poller: PollerConfig,
    cancel: CancellationToken,
}

impl<S: ArtifactStore, J: JobService> Orchestrator<S, J> {
    pub fn new(
        store: S,
        submitter: J,
        poll_service: J,
        app_name: String,
        job_name: String,
        configuration_template: String,
    ) -> Self {
        Self {
            store,
            submitter,
            poll_service,
            app_name,
            job_name,
            configuration_template,
            poller: PollerConfig::default(),
            cancel: CancellationToken::new(),
        }
    }

    /// Override the default poll schedule or deadline.
    pub fn with_poller_config(mut self, poller: PollerConfig) -> Self {
        self.poller = poller;
        self
    }

    /// Attach an external cancellation token, checked each poll
    /// iteration.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Deterministic artifact object name for this run.
    pub fn script_object_name(&self) -> String {
        format!("{}.py", self.app_name)
    }

    /// Execute the run: pack → link → submit → poll → report.
    ///
    /// Any failure before the job is processed aborts the run; the
    /// final report is logged only after a terminal status is
    /// observed.
    pub async fn run(&self, blocks: &[Block]) -> Result<JobOutcome, RunError> {
        // Pack.
        let script = assemble_script(blocks);
        let object_name = self.script_object_name();
        tracing::info!(
            app_name = %self.app_name,
            object_name = %object_name,
            size_bytes = script.len(),
            "Script packaged",
        );
        self.store.put(&object_name, script.into_bytes()).await?;

        // Link.
        let link = self.store.link(&object_name).await?;

        // Submit.
        let mut overrides = serde_json::Map::new();
        overrides.insert("mainApplicationFile".into(), link.uri.clone().into());
        for (key, value) in &link.config_overrides {
            overrides.insert(key.clone(), value.clone().into());
        }
        let request = JobRequest {
            app_name: self.app_name.clone(),
            job_name: self.job_name.clone(),
            config_template_name: self.configuration_template.clone(),
            config_overrides: overrides,
        };
        let response = self.submitter.submit(&request).await?;
        tracing::info!(
            app_name = %self.app_name,
            job_name = %self.job_name,
            response_fields = response.len(),
            "Job submitted",
        );

        // Poll.
        let outcome =
            poll_until_processed(&self.poll_service, &self.app_name, &self.poller, &self.cancel)
                .await?;

        // Report.
        let report = render_report(&outcome.status, outcome.metrics.as_ref());
        for line in report.lines() {
            tracing::info!(target: "run_report", "{line}");
        }

        Ok(outcome)
    }
}
