//! Paginated job history with settle-driven refresh.
//!
//! The lister owns the page/page-size state for one job kind and a small TTL
//! cache of fetched pages. When a tracked job settles (the
//! [`crate::session::TrackUpdate::Settled`] signal), callers invoke
//! [`HistoryLister::on_job_settled`] so the next read reflects the finished
//! job instead of a cached page.

use std::time::Duration;

use tracing::debug;

use crate::cache::TtlCache;
use crate::error::{Result, TrackError};
use crate::job::{HistoryPage, JobSnapshot};
use crate::status::JobKind;

/// Lists past jobs of one kind, newest first.
#[async_trait::async_trait]
pub trait HistorySource: Send + Sync {
    async fn list(
        &self,
        kind: JobKind,
        page: u32,
        page_size: u32,
    ) -> anyhow::Result<HistoryPage<JobSnapshot>>;
}

const DEFAULT_PAGE_SIZE: u32 = 10;
const CACHE_TTL: Duration = Duration::from_secs(30);
const CACHE_CAPACITY: usize = 16;

/// Paginated history view for one job kind.
pub struct HistoryLister<S> {
    source: S,
    kind: JobKind,
    page: u32,
    page_size: u32,
    cache: TtlCache<(u32, u32), HistoryPage<JobSnapshot>>,
}

impl<S: HistorySource> HistoryLister<S> {
    pub fn new(source: S, kind: JobKind) -> Self {
        Self {
            source,
            kind,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            cache: TtlCache::new(CACHE_TTL, CACHE_CAPACITY),
        }
    }

    pub fn kind(&self) -> JobKind {
        self.kind
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    pub fn set_page_size(&mut self, page_size: u32) {
        if page_size != self.page_size {
            self.page_size = page_size.max(1);
            // Old pages were cut at a different size; they no longer line up.
            self.cache.clear();
            self.page = 1;
        }
    }

    /// Current page, served from cache when fresh.
    pub async fn current(&mut self) -> Result<HistoryPage<JobSnapshot>> {
        let key = (self.page, self.page_size);
        if let Some(page) = self.cache.get(&key) {
            return Ok(page.clone());
        }
        self.fetch(key).await
    }

    /// Re-fetch the current page, bypassing the cache.
    pub async fn refresh(&mut self) -> Result<HistoryPage<JobSnapshot>> {
        let key = (self.page, self.page_size);
        self.cache.invalidate(&key);
        self.fetch(key).await
    }

    /// A tracked job of this kind reached a terminal state: every cached
    /// page is stale now.
    pub fn on_job_settled(&mut self) {
        debug!(kind = %self.kind, "job settled, dropping cached history pages");
        self.cache.clear();
    }

    async fn fetch(&mut self, key: (u32, u32)) -> Result<HistoryPage<JobSnapshot>> {
        let page = self
            .source
            .list(self.kind, key.0, key.1)
            .await
            .map_err(TrackError::Backend)?;
        self.cache.insert(key, page.clone());
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobCounters;
    use crate::status::JobStatus;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct CountingSource {
        calls: Arc<AtomicU32>,
    }

    #[async_trait::async_trait]
    impl HistorySource for CountingSource {
        async fn list(
            &self,
            kind: JobKind,
            page: u32,
            page_size: u32,
        ) -> anyhow::Result<HistoryPage<JobSnapshot>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(HistoryPage {
                items: vec![JobSnapshot {
                    id: format!("{kind}-{page}"),
                    kind,
                    status: JobStatus::Completed,
                    counters: JobCounters::new(10, 10, 0),
                    created_at: None,
                    started_at: None,
                    completed_at: None,
                    error_summary: BTreeMap::new(),
                }],
                page,
                page_size,
                total: 42,
            })
        }
    }

    fn lister() -> (HistoryLister<CountingSource>, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        let source = CountingSource {
            calls: Arc::clone(&calls),
        };
        (HistoryLister::new(source, JobKind::Broadcast), calls)
    }

    #[tokio::test]
    async fn test_current_is_cached() {
        let (mut lister, calls) = lister();
        let a = lister.current().await.unwrap();
        let b = lister.current().await.unwrap();
        assert_eq!(a, b);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_page_change_fetches_fresh() {
        let (mut lister, calls) = lister();
        lister.current().await.unwrap();
        lister.set_page(2);
        let page = lister.current().await.unwrap();
        assert_eq!(page.page, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        // Going back to a cached page costs nothing.
        lister.set_page(1);
        lister.current().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_settle_signal_invalidates_cache() {
        let (mut lister, calls) = lister();
        lister.current().await.unwrap();
        lister.on_job_settled();
        lister.current().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_refresh_bypasses_cache() {
        let (mut lister, calls) = lister();
        lister.current().await.unwrap();
        lister.refresh().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_page_size_change_resets_view() {
        let (mut lister, calls) = lister();
        lister.set_page(3);
        lister.current().await.unwrap();
        lister.set_page_size(25);
        assert_eq!(lister.page(), 1);
        let page = lister.current().await.unwrap();
        assert_eq!(page.page_size, 25);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_page_floor_is_one() {
        let (mut lister, _) = lister();
        lister.set_page(0);
        assert_eq!(lister.page(), 1);
    }
}
