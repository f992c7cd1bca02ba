//! Bounded retry policy for requests to the job API.
//!
//! Only transient conditions are retried: 5xx responses and
//! transport-level errors. 4xx responses are never retried — they are
//! the caller's problem and repeating them cannot help.

use std::time::Duration;

/// Retry budget and pacing shared by submission and status fetches.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles per further attempt.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Decide whether attempt `attempt` (1-based) may be followed by
    /// another. `status` is the HTTP status received, or `None` for a
    /// transport-level error.
    pub fn should_retry(&self, attempt: u32, status: Option<u16>) -> bool {
        if attempt >= self.max_attempts {
            return false;
        }
        match status {
            Some(code) => code >= 500,
            None => true,
        }
    }

    /// Delay to sleep after a failed attempt `attempt` (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}
