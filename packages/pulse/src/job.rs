//! Job snapshots, details, and history pages.
//!
//! A [`JobSnapshot`] is the client's view of one backend batch job at one
//! point in time. Snapshots are produced by the backend and never mutated
//! here: counters are monotonically non-decreasing while the job is live and
//! frozen once the status is terminal. A retried job is superseded by a new
//! job with a new id, never rewritten in place.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::status::{JobKind, JobStatus};

/// Progress counters for a batch job.
///
/// Invariant: `succeeded + failed <= total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobCounters {
    pub total: u64,
    pub succeeded: u64,
    pub failed: u64,
}

impl JobCounters {
    pub fn new(total: u64, succeeded: u64, failed: u64) -> Self {
        Self {
            total,
            succeeded,
            failed,
        }
    }

    /// Recipients the backend has finished with, success or failure.
    pub fn processed(&self) -> u64 {
        self.succeeded + self.failed
    }

    /// Whether the counters satisfy `succeeded + failed <= total`.
    pub fn is_consistent(&self) -> bool {
        self.processed() <= self.total
    }
}

/// One point-in-time view of a backend batch job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    /// Opaque identifier issued by the backend (`batch_id` / `audit_uuid`).
    pub id: String,
    pub kind: JobKind,
    pub status: JobStatus,
    pub counters: JobCounters,
    pub created_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Error-code to occurrence count. Empty when nothing has failed.
    #[serde(default)]
    pub error_summary: BTreeMap<String, u64>,
}

impl JobSnapshot {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// A single per-recipient failure record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipientFailure {
    /// Reference to the recipient (user id, channel id, ...).
    pub recipient_ref: String,
    pub error_message: String,
    pub is_retryable: bool,
}

/// Full job detail: the snapshot plus the ordered failure breakdown.
///
/// Fetched on explicit user request only, never by the poller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDetail {
    pub snapshot: JobSnapshot,
    pub failures: Vec<RecipientFailure>,
}

impl JobDetail {
    /// A retry is offered only when at least one failure is retryable.
    pub fn has_retryable_failures(&self) -> bool {
        self.failures.iter().any(|f| f.is_retryable)
    }
}

/// Acknowledgement of a retry request. The new job supersedes the old one
/// and is tracked through a fresh polling session by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryStarted {
    pub new_job_id: String,
    pub message: Option<String>,
}

/// One page of job summaries plus pagination metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPage<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
}

impl<T> HistoryPage<T> {
    pub fn empty(page: u32, page_size: u32) -> Self {
        Self {
            items: Vec::new(),
            page,
            page_size,
            total: 0,
        }
    }

    /// Number of pages given the reported total.
    pub fn page_count(&self) -> u32 {
        if self.page_size == 0 || self.total == 0 {
            return 0;
        }
        self.total.div_ceil(self.page_size as u64) as u32
    }
}
