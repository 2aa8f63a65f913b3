//! Detail viewing and retry of failed recipients.
//!
//! Detail is fetched on explicit user request only — the poller never touches
//! these endpoints. Retrying produces a brand-new job id; the viewer does not
//! poll it, the caller starts a fresh [`crate::session::PollingSession`].

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::error::{Result, TrackError};
use crate::job::{JobDetail, RetryStarted};

/// Backend operations for the detail/retry viewer.
#[async_trait::async_trait]
pub trait DetailSource: Send + Sync {
    async fn fetch_detail(&self, job_id: &str) -> anyhow::Result<JobDetail>;
    async fn retry(&self, job_id: &str) -> anyhow::Result<RetryStarted>;
}

/// Per-job-id in-flight guard for retry submissions.
///
/// A second retry for the same id while one is pending is rejected locally,
/// before any request is issued. Retries for distinct ids may run
/// concurrently.
#[derive(Debug, Clone, Default)]
pub struct RetryGate {
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl RetryGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the id. Returns a guard that releases on drop, or `None` when a
    /// retry for this id is already pending.
    pub fn try_begin(&self, job_id: &str) -> Option<RetryGuard> {
        let mut in_flight = self.in_flight.lock().expect("retry gate poisoned");
        if !in_flight.insert(job_id.to_string()) {
            return None;
        }
        Some(RetryGuard {
            gate: Arc::clone(&self.in_flight),
            job_id: job_id.to_string(),
        })
    }

    pub fn is_pending(&self, job_id: &str) -> bool {
        self.in_flight
            .lock()
            .expect("retry gate poisoned")
            .contains(job_id)
    }
}

/// Releases the claimed id when dropped, including on error paths.
#[derive(Debug)]
pub struct RetryGuard {
    gate: Arc<Mutex<HashSet<String>>>,
    job_id: String,
}

impl Drop for RetryGuard {
    fn drop(&mut self) {
        self.gate
            .lock()
            .expect("retry gate poisoned")
            .remove(&self.job_id);
    }
}

/// Detail/retry viewer over a [`DetailSource`].
pub struct DetailViewer<S> {
    source: S,
    gate: RetryGate,
}

impl<S: DetailSource> DetailViewer<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            gate: RetryGate::new(),
        }
    }

    /// Fetch the full detail for a job. A failure surfaces as an error the
    /// caller renders; it never tears the viewer down.
    pub async fn load(&self, job_id: &str) -> Result<JobDetail> {
        if job_id.is_empty() {
            return Err(TrackError::Validation("job id must not be empty".into()));
        }
        self.source
            .fetch_detail(job_id)
            .await
            .map_err(TrackError::Backend)
    }

    /// Submit a retry for the failed recipients of `job_id`.
    ///
    /// Rejected with [`TrackError::RetryInFlight`] when a retry for this id
    /// is already pending — no duplicate request is issued. On success the
    /// caller is responsible for tracking `new_job_id`.
    pub async fn retry_failed(&self, job_id: &str) -> Result<RetryStarted> {
        if job_id.is_empty() {
            return Err(TrackError::Validation("job id must not be empty".into()));
        }
        let _guard = self
            .gate
            .try_begin(job_id)
            .ok_or_else(|| TrackError::RetryInFlight {
                job_id: job_id.to_string(),
            })?;

        debug!(job_id, "submitting retry for failed recipients");
        self.source
            .retry(job_id)
            .await
            .map_err(TrackError::Backend)
    }

    /// Whether a retry for this id is currently pending.
    pub fn retry_pending(&self, job_id: &str) -> bool {
        self.gate.is_pending(job_id)
    }
}
