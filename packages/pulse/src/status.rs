//! Job kinds and status normalization.
//!
//! The backend speaks two status vocabularies: broadcast and cleanup batches
//! report lowercase snake_case statuses (`in_progress`, `completed`, ...),
//! while channel audits report uppercase words (`RUNNING`, `COMPLETED`, ...).
//! Everything downstream of this module works with one normalized
//! [`JobStatus`] enumeration; the per-kind tables live here and nowhere else.
//!
//! Statuses the table has never seen are funneled into
//! [`JobStatus::Unknown`] rather than guessed at. Unknown statuses are
//! treated as non-terminal (polling continues) and render as a neutral badge.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of batch job being tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Message broadcast to a user segment.
    Broadcast,
    /// Channel membership audit.
    ChannelAudit,
    /// Removal of expired members from a channel, started from an audit.
    ChannelCleanup,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Broadcast => "broadcast",
            JobKind::ChannelAudit => "channel_audit",
            JobKind::ChannelCleanup => "channel_cleanup",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized job status shared by every job kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Cancelled,
    /// A status the normalization table does not know. Carries the raw wire
    /// text so it can still be displayed.
    Unknown(String),
}

impl JobStatus {
    /// Normalize a raw wire status for the given job kind.
    ///
    /// Audit statuses are matched case-insensitively; the backend has been
    /// observed emitting both `RUNNING` and `running`. The audit table has no
    /// cancelled mapping because the backend has never reported one — if it
    /// ever does, the raw text surfaces as `Unknown("CANCELLED")` instead of
    /// being silently misread.
    pub fn normalize(kind: JobKind, raw: &str) -> JobStatus {
        match kind {
            JobKind::Broadcast | JobKind::ChannelCleanup => match raw {
                "pending" => JobStatus::Pending,
                "in_progress" => JobStatus::InProgress,
                "completed" => JobStatus::Completed,
                "failed" => JobStatus::Failed,
                "cancelled" => JobStatus::Cancelled,
                other => JobStatus::Unknown(other.to_string()),
            },
            JobKind::ChannelAudit => match raw.to_ascii_uppercase().as_str() {
                "PENDING" => JobStatus::Pending,
                "RUNNING" => JobStatus::InProgress,
                "COMPLETED" => JobStatus::Completed,
                "FAILED" => JobStatus::Failed,
                _ => JobStatus::Unknown(raw.to_string()),
            },
        }
    }

    /// A terminal job never transitions back to a non-terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }

    /// Display label for badges and log lines.
    pub fn label(&self) -> &str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::InProgress => "in progress",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
            JobStatus::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_vocabulary() {
        let k = JobKind::Broadcast;
        assert_eq!(JobStatus::normalize(k, "pending"), JobStatus::Pending);
        assert_eq!(JobStatus::normalize(k, "in_progress"), JobStatus::InProgress);
        assert_eq!(JobStatus::normalize(k, "completed"), JobStatus::Completed);
        assert_eq!(JobStatus::normalize(k, "failed"), JobStatus::Failed);
        assert_eq!(JobStatus::normalize(k, "cancelled"), JobStatus::Cancelled);
    }

    #[test]
    fn test_cleanup_uses_broadcast_vocabulary() {
        let k = JobKind::ChannelCleanup;
        assert_eq!(JobStatus::normalize(k, "in_progress"), JobStatus::InProgress);
        assert_eq!(JobStatus::normalize(k, "completed"), JobStatus::Completed);
    }

    #[test]
    fn test_audit_vocabulary_is_case_insensitive() {
        let k = JobKind::ChannelAudit;
        assert_eq!(JobStatus::normalize(k, "RUNNING"), JobStatus::InProgress);
        assert_eq!(JobStatus::normalize(k, "running"), JobStatus::InProgress);
        assert_eq!(JobStatus::normalize(k, "Completed"), JobStatus::Completed);
        assert_eq!(JobStatus::normalize(k, "FAILED"), JobStatus::Failed);
        assert_eq!(JobStatus::normalize(k, "PENDING"), JobStatus::Pending);
    }

    #[test]
    fn test_unknown_statuses_are_not_guessed() {
        // Broadcast casing does not apply to audits and vice versa.
        assert_eq!(
            JobStatus::normalize(JobKind::Broadcast, "RUNNING"),
            JobStatus::Unknown("RUNNING".to_string())
        );
        // Audits have never reported a cancelled state; do not assume.
        assert_eq!(
            JobStatus::normalize(JobKind::ChannelAudit, "CANCELLED"),
            JobStatus::Unknown("CANCELLED".to_string())
        );
    }

    #[test]
    fn test_terminal_predicate() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::InProgress.is_terminal());
        // Unknown keeps polling; stopping on an unrecognized status could
        // strand an in-flight job.
        assert!(!JobStatus::Unknown("weird".into()).is_terminal());
    }

    #[test]
    fn test_unknown_label_carries_raw_text() {
        let s = JobStatus::Unknown("ARCHIVED".into());
        assert_eq!(s.label(), "ARCHIVED");
        assert_eq!(s.to_string(), "ARCHIVED");
    }
}
