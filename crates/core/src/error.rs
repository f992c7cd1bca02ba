//! Top-level error classes.
//!
//! Every failure in a run is classified as either a user error (bad
//! configuration, upstream 4xx, missing parameters, exhausted retries
//! against a flaky upstream) or an internal error. The class decides
//! the process exit code: 0 success, 1 user, 2 internal.

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// Caused by the user's configuration or by the upstream service
    /// rejecting the request. Surfaced with the originating message.
    #[error("{0}")]
    User(String),

    /// Unexpected condition inside this component.
    #[error("{0}")]
    Internal(String),
}

impl RunError {
    /// Process exit code for this error class.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::User(_) => 1,
            RunError::Internal(_) => 2,
        }
    }
}

/// Failures while loading or validating the run configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Config file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

impl From<ConfigError> for RunError {
    fn from(e: ConfigError) -> Self {
        RunError::User(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_component_convention() {
        assert_eq!(RunError::User("bad".into()).exit_code(), 1);
        assert_eq!(RunError::Internal("boom".into()).exit_code(), 2);
    }

    #[test]
    fn config_errors_are_user_errors() {
        let e = ConfigError::Read {
            path: "/data/config.json".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        let run_error: RunError = e.into();
        assert_eq!(run_error.exit_code(), 1);
    }
}
