//! HTTP client for the Data Mechanics job API.
//!
//! Provides typed status payloads, the bounded retry policy shared by
//! submission and polling, and the [`JobService`] seam the
//! orchestrator drives (job creation, status fetch, log streaming).

pub mod api;
pub mod retry;
pub mod status;

pub use api::{ApiError, DataMechanicsApi, JobRequest, JobService};
pub use retry::RetryPolicy;
pub use status::{AppResponse, JobState, JobStatus};
