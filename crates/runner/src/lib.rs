//! Job-lifecycle orchestration.
//!
//! Composes the artifact store and job service in strict sequence:
//! pack the script, generate its access link, submit the job, poll
//! with bounded exponential backoff until the job is processed, then
//! report timestamps and metrics.

pub mod backoff;
pub mod orchestrator;
pub mod poller;
pub mod report;

pub use backoff::PollBackoff;
pub use orchestrator::Orchestrator;
pub use poller::{poll_until_processed, JobOutcome, PollError, PollerConfig};
pub use report::render_report;
