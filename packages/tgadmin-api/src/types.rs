//! Wire types for the ops backend, plus conversion into the normalized
//! `pulse` job model.
//!
//! The backend's two status vocabularies (snake_case for batches, uppercase
//! for audits) are normalized here via [`pulse::JobStatus::normalize`]; raw
//! wire statuses never leave this crate.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pulse::{
    HistoryPage, JobCounters, JobDetail, JobKind, JobSnapshot, JobStatus, RecipientFailure,
    RetryStarted,
};

/// Response to a broadcast creation request.
#[derive(Debug, Clone, Deserialize)]
pub struct BroadcastCreated {
    pub batch_id: String,
}

/// Request body for starting a broadcast.
#[derive(Debug, Clone, Serialize)]
pub struct BroadcastRequest {
    pub message: String,
    pub target_group: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_type_id: Option<i64>,
}

/// Status of a broadcast or cleanup batch.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchStatus {
    pub batch_id: String,
    pub status: String,
    pub total_users: u64,
    pub successful_sends: u64,
    pub failed_sends: u64,
    pub created_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub error_summary: BTreeMap<String, u64>,
}

impl BatchStatus {
    pub fn into_snapshot(self, kind: JobKind) -> JobSnapshot {
        JobSnapshot {
            id: self.batch_id,
            kind,
            status: JobStatus::normalize(kind, &self.status),
            counters: JobCounters::new(self.total_users, self.successful_sends, self.failed_sends),
            created_at: self.created_at,
            started_at: self.started_at,
            completed_at: self.completed_at,
            error_summary: self.error_summary,
        }
    }
}

/// Per-recipient failure record in a batch detail.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchErrorDetail {
    pub user_id: i64,
    pub error_message: String,
    pub is_retryable: bool,
}

/// Full batch detail: status plus the ordered failure breakdown.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchDetail {
    #[serde(flatten)]
    pub status: BatchStatus,
    #[serde(default)]
    pub error_details: Vec<BatchErrorDetail>,
}

impl BatchDetail {
    pub fn into_detail(self, kind: JobKind) -> JobDetail {
        JobDetail {
            snapshot: self.status.into_snapshot(kind),
            failures: self
                .error_details
                .into_iter()
                .map(|d| RecipientFailure {
                    recipient_ref: d.user_id.to_string(),
                    error_message: d.error_message,
                    is_retryable: d.is_retryable,
                })
                .collect(),
        }
    }
}

/// Response to a retry-failed request.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchRetryResponse {
    pub new_batch_id: String,
    pub message: Option<String>,
}

impl From<BatchRetryResponse> for RetryStarted {
    fn from(r: BatchRetryResponse) -> Self {
        RetryStarted {
            new_job_id: r.new_batch_id,
            message: r.message,
        }
    }
}

/// One page of broadcast history.
#[derive(Debug, Clone, Deserialize)]
pub struct BroadcastHistory {
    pub batches: Vec<BatchStatus>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
}

impl BroadcastHistory {
    pub fn into_page(self, kind: JobKind) -> HistoryPage<JobSnapshot> {
        HistoryPage {
            items: self
                .batches
                .into_iter()
                .map(|b| b.into_snapshot(kind))
                .collect(),
            page: self.page,
            page_size: self.page_size,
            total: self.total,
        }
    }
}

/// Response to an audit creation request.
#[derive(Debug, Clone, Deserialize)]
pub struct AuditCreated {
    pub audit_uuid: String,
}

/// Per-channel result inside an audit.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChannelResult {
    pub channel_id: i64,
    pub channel_name: Option<String>,
    /// Members checked against active subscriptions.
    pub checked_members: u64,
    /// Members with no active subscription, eligible for cleanup.
    pub removable_members: u64,
}

/// Status of a channel audit. Audits count channels, not recipients.
#[derive(Debug, Clone, Deserialize)]
pub struct AuditStatus {
    pub audit_uuid: String,
    pub status: String,
    pub total_channels: u64,
    pub audited_channels: u64,
    pub failed_channels: u64,
    pub created_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub channel_results: Vec<ChannelResult>,
}

impl AuditStatus {
    pub fn into_snapshot(self) -> JobSnapshot {
        let kind = JobKind::ChannelAudit;
        JobSnapshot {
            id: self.audit_uuid,
            kind,
            status: JobStatus::normalize(kind, &self.status),
            counters: JobCounters::new(
                self.total_channels,
                self.audited_channels,
                self.failed_channels,
            ),
            created_at: self.created_at,
            started_at: self.started_at,
            completed_at: self.completed_at,
            error_summary: BTreeMap::new(),
        }
    }
}

/// Audit history is returned unpaginated by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct AuditHistory {
    pub audits: Vec<AuditStatus>,
}

impl AuditHistory {
    pub fn into_page(self) -> HistoryPage<JobSnapshot> {
        let total = self.audits.len() as u64;
        let page_size = self.audits.len().max(1) as u32;
        HistoryPage {
            items: self.audits.into_iter().map(|a| a.into_snapshot()).collect(),
            page: 1,
            page_size,
            total,
        }
    }
}

/// Response to a cleanup start request. Cleanups run as batches and are
/// tracked through the batch status endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CleanupStarted {
    pub batch_id: String,
}

/// A channel member eligible for removal.
#[derive(Debug, Clone, Deserialize)]
pub struct RemovableUser {
    pub user_id: i64,
    pub username: Option<String>,
    pub full_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_status_into_snapshot() {
        let dto: BatchStatus = serde_json::from_value(serde_json::json!({
            "batch_id": "b-17",
            "status": "in_progress",
            "total_users": 100,
            "successful_sends": 40,
            "failed_sends": 5,
            "created_at": "2024-05-01T10:00:00Z",
            "started_at": "2024-05-01T10:00:03Z",
            "completed_at": null,
            "error_summary": { "blocked": 3, "deactivated": 2 }
        }))
        .unwrap();

        let snap = dto.into_snapshot(JobKind::Broadcast);
        assert_eq!(snap.id, "b-17");
        assert_eq!(snap.status, JobStatus::InProgress);
        assert_eq!(snap.counters, JobCounters::new(100, 40, 5));
        assert_eq!(snap.error_summary.get("blocked"), Some(&3));
        assert!(snap.completed_at.is_none());
    }

    #[test]
    fn test_batch_status_missing_summary_defaults_empty() {
        let dto: BatchStatus = serde_json::from_value(serde_json::json!({
            "batch_id": "b-1",
            "status": "pending",
            "total_users": 10,
            "successful_sends": 0,
            "failed_sends": 0,
            "created_at": null,
            "started_at": null,
            "completed_at": null
        }))
        .unwrap();
        assert!(dto.error_summary.is_empty());
    }

    #[test]
    fn test_batch_detail_flattens_status() {
        let dto: BatchDetail = serde_json::from_value(serde_json::json!({
            "batch_id": "b-17",
            "status": "completed",
            "total_users": 3,
            "successful_sends": 1,
            "failed_sends": 2,
            "created_at": null,
            "started_at": null,
            "completed_at": null,
            "error_details": [
                { "user_id": 42, "error_message": "blocked by user", "is_retryable": false },
                { "user_id": 43, "error_message": "flood wait", "is_retryable": true }
            ]
        }))
        .unwrap();

        let detail = dto.into_detail(JobKind::Broadcast);
        assert_eq!(detail.failures.len(), 2);
        assert_eq!(detail.failures[0].recipient_ref, "42");
        assert!(detail.has_retryable_failures());
        assert_eq!(detail.snapshot.status, JobStatus::Completed);
    }

    #[test]
    fn test_audit_status_normalizes_uppercase() {
        let dto: AuditStatus = serde_json::from_value(serde_json::json!({
            "audit_uuid": "a-1",
            "status": "RUNNING",
            "total_channels": 4,
            "audited_channels": 2,
            "failed_channels": 0,
            "created_at": null,
            "started_at": null,
            "completed_at": null,
            "channel_results": [
                { "channel_id": -100123, "channel_name": "premium", "checked_members": 250, "removable_members": 12 }
            ]
        }))
        .unwrap();

        assert_eq!(dto.channel_results.len(), 1);
        let snap = dto.into_snapshot();
        assert_eq!(snap.kind, JobKind::ChannelAudit);
        assert_eq!(snap.status, JobStatus::InProgress);
        assert_eq!(snap.counters.total, 4);
    }

    #[test]
    fn test_retry_response_conversion() {
        let dto = BatchRetryResponse {
            new_batch_id: "b-18".into(),
            message: Some("retrying 2 recipients".into()),
        };
        let started: RetryStarted = dto.into();
        assert_eq!(started.new_job_id, "b-18");
    }

    #[test]
    fn test_broadcast_history_into_page() {
        let dto: BroadcastHistory = serde_json::from_value(serde_json::json!({
            "batches": [
                { "batch_id": "b-2", "status": "completed", "total_users": 5,
                  "successful_sends": 5, "failed_sends": 0,
                  "created_at": null, "started_at": null, "completed_at": null }
            ],
            "page": 2,
            "page_size": 10,
            "total": 11
        }))
        .unwrap();

        let page = dto.into_page(JobKind::Broadcast);
        assert_eq!(page.page, 2);
        assert_eq!(page.page_count(), 2);
        assert_eq!(page.items[0].status, JobStatus::Completed);
    }

    #[test]
    fn test_audit_history_is_single_page() {
        let dto: AuditHistory = serde_json::from_value(serde_json::json!({
            "audits": [
                { "audit_uuid": "a-1", "status": "COMPLETED", "total_channels": 2,
                  "audited_channels": 2, "failed_channels": 0,
                  "created_at": null, "started_at": null, "completed_at": null }
            ]
        }))
        .unwrap();

        let page = dto.into_page();
        assert_eq!(page.page, 1);
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].status, JobStatus::Completed);
    }
}
