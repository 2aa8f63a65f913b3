//! Adapters binding the client to the `pulse` tracking traits.
//!
//! One adapter per job kind, each a thin wrapper around a shared
//! [`TgAdminClient`]. Transport errors are passed through as `anyhow`
//! (internal transport); `pulse` converts them at its boundary.

use std::sync::Arc;

use pulse::{
    DetailSource, HistoryPage, HistorySource, JobDetail, JobKind, JobSnapshot, RetryStarted,
    StatusSource,
};

use crate::TgAdminClient;

/// Broadcast batches: status, detail/retry, and paginated history.
#[derive(Clone)]
pub struct BroadcastJobs {
    client: Arc<TgAdminClient>,
}

impl BroadcastJobs {
    pub fn new(client: Arc<TgAdminClient>) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl StatusSource for BroadcastJobs {
    async fn fetch_status(&self, job_id: &str) -> anyhow::Result<Option<JobSnapshot>> {
        Ok(self.client.broadcast_status(job_id).await?)
    }
}

#[async_trait::async_trait]
impl DetailSource for BroadcastJobs {
    async fn fetch_detail(&self, job_id: &str) -> anyhow::Result<JobDetail> {
        Ok(self.client.broadcast_detail(job_id).await?)
    }

    async fn retry(&self, job_id: &str) -> anyhow::Result<RetryStarted> {
        Ok(self.client.retry_broadcast(job_id).await?)
    }
}

#[async_trait::async_trait]
impl HistorySource for BroadcastJobs {
    async fn list(
        &self,
        _kind: JobKind,
        page: u32,
        page_size: u32,
    ) -> anyhow::Result<HistoryPage<JobSnapshot>> {
        Ok(self.client.broadcast_history(page, page_size).await?)
    }
}

/// Channel audits: status and (unpaginated) history.
#[derive(Clone)]
pub struct AuditJobs {
    client: Arc<TgAdminClient>,
}

impl AuditJobs {
    pub fn new(client: Arc<TgAdminClient>) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl StatusSource for AuditJobs {
    async fn fetch_status(&self, job_id: &str) -> anyhow::Result<Option<JobSnapshot>> {
        Ok(self
            .client
            .audit_status(job_id)
            .await?
            .map(|a| a.into_snapshot()))
    }
}

#[async_trait::async_trait]
impl HistorySource for AuditJobs {
    async fn list(
        &self,
        _kind: JobKind,
        _page: u32,
        _page_size: u32,
    ) -> anyhow::Result<HistoryPage<JobSnapshot>> {
        // The backend returns all audits at once; pagination is nominal.
        Ok(self.client.audit_history().await?)
    }
}

/// Cleanup batches: tracked like broadcasts, tagged as cleanups.
#[derive(Clone)]
pub struct CleanupJobs {
    client: Arc<TgAdminClient>,
}

impl CleanupJobs {
    pub fn new(client: Arc<TgAdminClient>) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl StatusSource for CleanupJobs {
    async fn fetch_status(&self, job_id: &str) -> anyhow::Result<Option<JobSnapshot>> {
        Ok(self.client.cleanup_status(job_id).await?)
    }
}
