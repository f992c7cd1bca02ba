//! Typed payloads returned by the job API.
//!
//! A status snapshot is replaced wholesale on every poll; nothing is
//! merged across polls. Metrics appear only once the job has been
//! processed server-side.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Remote execution state of a job.
///
/// `is_processed` on [`JobStatus`], not the state, is what ends the
/// poll loop; unknown states are carried through verbatim so new
/// server-side states do not break polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Submitted,
    Running,
    Completed,
    Failed,
    Killed,
    Unknown(String),
}

impl From<&str> for JobState {
    fn from(raw: &str) -> Self {
        match raw {
            "SUBMITTED" => JobState::Submitted,
            "RUNNING" => JobState::Running,
            "COMPLETED" => JobState::Completed,
            "FAILED" => JobState::Failed,
            "KILLED" => JobState::Killed,
            other => JobState::Unknown(other.to_string()),
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobState::Submitted => "SUBMITTED",
            JobState::Running => "RUNNING",
            JobState::Completed => "COMPLETED",
            JobState::Failed => "FAILED",
            JobState::Killed => "KILLED",
            JobState::Unknown(other) => other,
        };
        f.write_str(s)
    }
}

impl<'de> Deserialize<'de> for JobState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(JobState::from(raw.as_str()))
    }
}

/// Point-in-time status snapshot of a job.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    pub state: JobState,
    /// Terminal flag: once true, no further polling is needed.
    pub is_processed: bool,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
}

/// Full `GET /apps/{appName}` response body.
#[derive(Debug, Clone, Deserialize)]
pub struct AppResponse {
    pub status: JobStatus,
    /// Metric name → value map, present once the job is processed.
    /// Key order is preserved as provided by the service.
    #[serde(default)]
    pub metrics: Option<serde_json::Map<String, serde_json::Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_full_status() {
        let raw = r#"{
            "status": {
                "state": "COMPLETED",
                "isProcessed": true,
                "startedAt": "2024-03-01T10:00:00Z",
                "endedAt": "2024-03-01T10:05:00Z"
            },
            "metrics": { "rowsRead": 120, "durationSeconds": "300" }
        }"#;
        let resp: AppResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.status.state, JobState::Completed);
        assert!(resp.status.is_processed);
        assert!(resp.status.started_at.is_some());
        assert!(resp.status.ended_at.is_some());
        let metrics = resp.metrics.unwrap();
        let keys: Vec<&String> = metrics.keys().collect();
        assert_eq!(keys, ["rowsRead", "durationSeconds"]);
    }

    #[test]
    fn ended_at_and_metrics_may_be_absent() {
        let raw = r#"{
            "status": { "state": "RUNNING", "isProcessed": false, "startedAt": "2024-03-01T10:00:00Z" }
        }"#;
        let resp: AppResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.status.state, JobState::Running);
        assert!(!resp.status.is_processed);
        assert!(resp.status.ended_at.is_none());
        assert!(resp.metrics.is_none());
    }

    #[test]
    fn unknown_state_is_preserved_verbatim() {
        let raw = r#"{ "status": { "state": "SCHEDULED", "isProcessed": false } }"#;
        let resp: AppResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.status.state, JobState::Unknown("SCHEDULED".into()));
        assert_eq!(resp.status.state.to_string(), "SCHEDULED");
    }

    #[test]
    fn state_display_round_trips_known_states() {
        for name in ["SUBMITTED", "RUNNING", "COMPLETED", "FAILED", "KILLED"] {
            assert_eq!(JobState::from(name).to_string(), name);
        }
    }
}
