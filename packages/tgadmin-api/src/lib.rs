//! Typed REST client for the subscription-bot ops backend.
//!
//! Covers the batch-job surface: starting broadcasts, auditing channel
//! membership, cleaning up expired members, and tracking all three as jobs.
//! Status endpoints return `Ok(None)` on 404 so the caller's not-found retry
//! policy can decide what to do; every other non-success status is an error.
//!
//! # Example
//!
//! ```rust,ignore
//! use tgadmin_api::TgAdminClient;
//!
//! let client = TgAdminClient::new("https://ops.example.com".into(), token);
//! let created = client.create_broadcast("renewal reminder", "expiring", None).await?;
//! let snapshot = client.broadcast_status(&created.batch_id).await?;
//! ```

pub mod error;
pub mod sources;
pub mod types;

pub use error::{ApiError, Result};
pub use sources::{AuditJobs, BroadcastJobs, CleanupJobs};
pub use types::{
    AuditCreated, AuditHistory, AuditStatus, BatchDetail, BatchRetryResponse, BatchStatus,
    BroadcastCreated, BroadcastHistory, BroadcastRequest, ChannelResult, CleanupStarted,
    RemovableUser,
};

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use pulse::{HistoryPage, JobDetail, JobKind, JobSnapshot, RetryStarted};

/// Per-request timeout. A hung request fails instead of stalling a polling
/// session's next tick indefinitely.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct TgAdminClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl TgAdminClient {
    pub fn new(base_url: String, token: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    // ------------------------------------------------------------------
    // Broadcasts
    // ------------------------------------------------------------------

    /// Start a broadcast to a target group. Returns immediately with the
    /// batch id; progress is tracked by polling [`broadcast_status`].
    ///
    /// [`broadcast_status`]: TgAdminClient::broadcast_status
    pub async fn create_broadcast(
        &self,
        message: &str,
        target_group: &str,
        subscription_type_id: Option<i64>,
    ) -> Result<BroadcastCreated> {
        let body = BroadcastRequest {
            message: message.to_string(),
            target_group: target_group.to_string(),
            subscription_type_id,
        };
        tracing::info!(target_group, "starting broadcast");
        self.post("/api/broadcasts", &body).await
    }

    /// Latest snapshot of a broadcast batch, or `None` when the backend does
    /// not know the id yet.
    pub async fn broadcast_status(&self, batch_id: &str) -> Result<Option<JobSnapshot>> {
        let status: Option<BatchStatus> = self
            .get_optional(&format!("/api/broadcasts/{batch_id}/status"))
            .await?;
        Ok(status.map(|s| s.into_snapshot(JobKind::Broadcast)))
    }

    /// Full detail including the per-recipient error breakdown.
    pub async fn broadcast_detail(&self, batch_id: &str) -> Result<JobDetail> {
        let detail: BatchDetail = self
            .get(&format!("/api/broadcasts/{batch_id}/details"))
            .await?;
        Ok(detail.into_detail(JobKind::Broadcast))
    }

    /// Re-send to the failed recipients of a batch. The retry runs as a new
    /// batch; the response carries its id.
    pub async fn retry_broadcast(&self, batch_id: &str) -> Result<RetryStarted> {
        tracing::info!(batch_id, "retrying failed recipients");
        let resp: BatchRetryResponse = self
            .post(&format!("/api/broadcasts/{batch_id}/retry"), &())
            .await?;
        Ok(resp.into())
    }

    /// Paginated broadcast history, newest first.
    pub async fn broadcast_history(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<HistoryPage<JobSnapshot>> {
        let history: BroadcastHistory = self
            .get(&format!(
                "/api/broadcasts/history?page={page}&page_size={page_size}"
            ))
            .await?;
        Ok(history.into_page(JobKind::Broadcast))
    }

    // ------------------------------------------------------------------
    // Channel audits & cleanup
    // ------------------------------------------------------------------

    /// Start a membership audit across all managed channels.
    pub async fn create_audit(&self) -> Result<AuditCreated> {
        tracing::info!("starting channel audit");
        self.post("/api/channel-audits", &()).await
    }

    /// Latest audit snapshot with per-channel results, or `None` when the
    /// backend does not know the id yet.
    pub async fn audit_status(&self, audit_uuid: &str) -> Result<Option<AuditStatus>> {
        self.get_optional(&format!("/api/channel-audits/{audit_uuid}"))
            .await
    }

    /// All past audits (the backend does not paginate these).
    pub async fn audit_history(&self) -> Result<HistoryPage<JobSnapshot>> {
        let history: AuditHistory = self.get("/api/channel-audits/history").await?;
        Ok(history.into_page())
    }

    /// Members of `channel_id` with no active subscription, per the audit.
    pub async fn removable_users(
        &self,
        audit_uuid: &str,
        channel_id: i64,
    ) -> Result<Vec<RemovableUser>> {
        self.get(&format!(
            "/api/channel-audits/{audit_uuid}/channels/{channel_id}/removable"
        ))
        .await
    }

    /// Kick off removal of expired members found by an audit. The cleanup
    /// runs as a batch, tracked via [`cleanup_status`].
    ///
    /// [`cleanup_status`]: TgAdminClient::cleanup_status
    pub async fn start_cleanup(&self, audit_uuid: &str, channel_id: i64) -> Result<CleanupStarted> {
        tracing::info!(audit_uuid, channel_id, "starting channel cleanup");
        self.post(
            &format!("/api/channel-audits/{audit_uuid}/channels/{channel_id}/cleanup"),
            &(),
        )
        .await
    }

    /// Cleanup batches share the batch status endpoint; only the kind tag
    /// differs.
    pub async fn cleanup_status(&self, batch_id: &str) -> Result<Option<JobSnapshot>> {
        let status: Option<BatchStatus> = self
            .get_optional(&format!("/api/broadcasts/{batch_id}/status"))
            .await?;
        Ok(status.map(|s| s.into_snapshot(JobKind::ChannelCleanup)))
    }

    // ------------------------------------------------------------------
    // Plumbing
    // ------------------------------------------------------------------

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let resp = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::decode(resp).await
    }

    /// GET where a 404 is an expected answer, not an error.
    async fn get_optional<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let resp = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
            .send()
            .await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(Self::decode(resp).await?))
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let resp = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), %message, "backend returned error");
            return Err(ApiError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(resp.json().await?)
    }
}
