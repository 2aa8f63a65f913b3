//! Polling and retry policies.
//!
//! Two deliberately separate policies govern a tracked job:
//!
//! - [`NotFoundPolicy`] covers the initial fetch only: right after a job is
//!   created the backend may not show it yet, so the first fetch is retried a
//!   bounded number of times with a short fixed delay before giving up.
//! - [`PollPolicy`] covers the steady state: an unbounded cadence stopped
//!   only by a terminal status, a fetch error, or deactivation.
//!
//! The two use different delays and different failure semantics on purpose;
//! merging them would silently change observed behavior.

use std::time::Duration;

/// Bounded retry for a job id that is not yet visible server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotFoundPolicy {
    /// Delayed retries allowed after the immediate first fetch.
    pub max_attempts: u32,
    /// Fixed delay between retries.
    pub delay: Duration,
}

impl Default for NotFoundPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_millis(1500),
        }
    }
}

/// Steady-state polling cadence for a live (non-terminal) job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
        }
    }
}

impl PollPolicy {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}
