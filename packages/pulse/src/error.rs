//! Structured error types for job tracking.
//!
//! `anyhow::Error` is the internal transport inside sources (ergonomic for
//! adapters); [`TrackError`] is the only error type surfaced to callers.
//! A backend-reported job failure (`status = failed`) is NOT an error — it is
//! a valid terminal state delivered as a snapshot.

use thiserror::Error;

/// Errors surfaced by the tracking layer.
#[derive(Debug, Error)]
pub enum TrackError {
    /// The job id never became visible server-side within the bounded
    /// not-found retry budget.
    #[error("job {job_id} not found after {attempts} attempts")]
    NotFound { job_id: String, attempts: u32 },

    /// A status/detail/retry call failed (network or HTTP error).
    /// Polling halts; the caller may re-select the job to try again.
    #[error("backend call failed: {0}")]
    Backend(#[source] anyhow::Error),

    /// Caught client-side before any request was issued.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A retry for this job id is already in flight; no second request
    /// was issued.
    #[error("retry already in flight for job {job_id}")]
    RetryInFlight { job_id: String },
}

pub type Result<T> = std::result::Result<T, TrackError>;
