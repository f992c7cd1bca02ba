//! Bounded exponential backoff between status polls.
//!
//! The wait for attempt `n` is `clamp(exponent^n, min_wait, max_wait)`:
//! it grows slowly from the floor and saturates at the ceiling instead
//! of growing unbounded, bounding both polling frequency and staleness.

use std::time::Duration;

/// Tunable parameters for the poll backoff schedule.
#[derive(Debug, Clone)]
pub struct PollBackoff {
    /// Base of the exponential term.
    pub exponent: f64,
    /// Floor on the wait between polls.
    pub min_wait: Duration,
    /// Ceiling the wait saturates at.
    pub max_wait: Duration,
}

impl Default for PollBackoff {
    fn default() -> Self {
        Self {
            exponent: 1.1,
            min_wait: Duration::from_secs(5),
            max_wait: Duration::from_secs(60),
        }
    }
}

impl PollBackoff {
    /// Wait before the next poll, for 1-based attempt counter `attempt`.
    pub fn wait_for_attempt(&self, attempt: u32) -> Duration {
        let raw = self.exponent.powi(attempt as i32);
        let clamped = raw.clamp(self.min_wait.as_secs_f64(), self.max_wait.as_secs_f64());
        Duration::from_secs_f64(clamped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_attempt_waits_the_minimum() {
        let backoff = PollBackoff::default();
        // 1.1^1 is far below the 5s floor.
        assert_eq!(backoff.wait_for_attempt(1), Duration::from_secs(5));
    }

    #[test]
    fn wait_is_monotonically_non_decreasing() {
        let backoff = PollBackoff::default();
        let mut previous = Duration::ZERO;
        for attempt in 1..=120 {
            let wait = backoff.wait_for_attempt(attempt);
            assert!(
                wait >= previous,
                "wait decreased at attempt {attempt}: {wait:?} < {previous:?}"
            );
            previous = wait;
        }
    }

    #[test]
    fn wait_saturates_at_the_maximum() {
        let backoff = PollBackoff::default();
        // 1.1^45 ≈ 73s, well past the 60s ceiling.
        assert_eq!(backoff.wait_for_attempt(45), Duration::from_secs(60));
        assert_eq!(backoff.wait_for_attempt(100), Duration::from_secs(60));
    }

    #[test]
    fn wait_never_leaves_the_configured_bounds() {
        let backoff = PollBackoff::default();
        for attempt in 1..=200 {
            let wait = backoff.wait_for_attempt(attempt);
            assert!(wait >= Duration::from_secs(5), "below floor at {attempt}");
            assert!(wait <= Duration::from_secs(60), "above ceiling at {attempt}");
        }
    }

    #[test]
    fn exponential_region_grows_between_floor_and_ceiling() {
        let backoff = PollBackoff::default();
        // 1.1^20 ≈ 6.7s: inside the exponential region.
        let wait = backoff.wait_for_attempt(20);
        assert!(wait > Duration::from_secs(5));
        assert!(wait < Duration::from_secs(60));
    }
}
