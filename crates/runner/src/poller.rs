//! Completion poller.
//!
//! Drives the `SUBMITTED → POLLING → LOGS_FETCHED → DONE` state
//! machine: after an initial grace delay the job status is re-fetched
//! under bounded exponential backoff until the service reports the job
//! as processed. Logs are fetched at most once, when `COMPLETED` is
//! first observed. Cancellation and the optional deadline are checked
//! at the top of every iteration.

use std::time::Duration;

use sparkjob_core::error::RunError;
use sparkjob_datamechanics::api::{ApiError, JobService};
use sparkjob_datamechanics::status::{JobState, JobStatus};
use tokio_util::sync::CancellationToken;

use crate::backoff::PollBackoff;

/// Poller state. `FAILED` is implicit: any unrecoverable error exits
/// the loop from whichever state it was in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Submitted,
    Polling,
    LogsFetched,
    Done,
}

/// Tunable parameters for the poll loop.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Fixed delay before the first poll, giving the remote job time
    /// to register.
    pub grace_delay: Duration,
    /// Backoff schedule between polls.
    pub backoff: PollBackoff,
    /// Optional overall deadline. `None` polls until the job is
    /// processed, favoring eventual correctness over bounded
    /// wall-clock time.
    pub deadline: Option<Duration>,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            grace_delay: Duration::from_secs(5),
            backoff: PollBackoff::default(),
            deadline: None,
        }
    }
}

/// Terminal result of a successful poll loop.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    /// The final status snapshot that reported the job as processed.
    pub status: JobStatus,
    /// Metrics from the final snapshot, when the service provided any.
    pub metrics: Option<serde_json::Map<String, serde_json::Value>>,
    /// Whether job logs were fetched during the run.
    pub logs_fetched: bool,
}

/// Why the poll loop gave up.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error("Polling cancelled by caller")]
    Cancelled,

    #[error("Job did not complete within the {0:?} deadline")]
    DeadlineExceeded(Duration),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl From<PollError> for RunError {
    fn from(e: PollError) -> Self {
        RunError::User(e.to_string())
    }
}

/// Sleep for `duration`, aborting early if `cancel` fires.
async fn sleep_or_cancel(duration: Duration, cancel: &CancellationToken) -> Result<(), PollError> {
    tokio::select! {
        _ = cancel.cancelled() => Err(PollError::Cancelled),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}

/// Poll `app_name` until the service reports it processed.
///
/// Status snapshots are replaced wholesale each iteration. A malformed
/// status payload is treated as "not yet processed" — the next poll
/// re-fetches fresh state — while any other API failure (its retry
/// budget already spent in the client) is fatal. Log-stream failures
/// degrade to a warning since the job outcome is known independently.
pub async fn poll_until_processed<S: JobService>(
    service: &S,
    app_name: &str,
    config: &PollerConfig,
    cancel: &CancellationToken,
) -> Result<JobOutcome, PollError> {
    let started = tokio::time::Instant::now();
    let mut state = PollState::Submitted;
    let mut logs_fetched = false;
    let mut attempt: u32 = 1;

    tracing::debug!(
        app_name,
        state = ?state,
        grace_secs = config.grace_delay.as_secs(),
        "Waiting for the remote job to register",
    );
    sleep_or_cancel(config.grace_delay, cancel).await?;
    state = PollState::Polling;

    loop {
        if cancel.is_cancelled() {
            return Err(PollError::Cancelled);
        }
        if let Some(deadline) = config.deadline {
            if started.elapsed() >= deadline {
                return Err(PollError::DeadlineExceeded(deadline));
            }
        }

        let snapshot = match service.status(app_name).await {
            Ok(response) => Some(response),
            Err(ApiError::Json(e)) => {
                tracing::warn!(
                    app_name,
                    error = %e,
                    "Malformed status payload, treating as not yet processed",
                );
                None
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(response) = snapshot {
            if response.status.state == JobState::Completed && !logs_fetched {
                match service.stream_logs(app_name).await {
                    Ok(bytes) => {
                        tracing::info!(app_name, bytes, "Job logs fetched");
                    }
                    Err(e) => {
                        tracing::warn!(app_name, error = %e, "Failed to fetch job logs");
                    }
                }
                logs_fetched = true;
                state = PollState::LogsFetched;
            }

            if response.status.is_processed {
                state = PollState::Done;
                tracing::info!(app_name, state = ?state, "Job processed");
                return Ok(JobOutcome {
                    status: response.status,
                    metrics: response.metrics,
                    logs_fetched,
                });
            }
        }

        let wait = config.backoff.wait_for_attempt(attempt);
        tracing::debug!(
            app_name,
            attempt,
            wait_secs = wait.as_secs(),
            state = ?state,
            "Job not processed yet, backing off",
        );
        sleep_or_cancel(wait, cancel).await?;
        attempt += 1;
    }
}
