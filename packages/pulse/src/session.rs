//! Async polling session: drives a [`Tracker`] over real time.
//!
//! A [`PollingSession`] owns one tokio task that repeatedly fetches a job's
//! status through a [`StatusSource`] and forwards tracker output to a channel
//! of [`TrackUpdate`]s. Fetches are sequential within a session — the next
//! tick is scheduled only after the previous request resolves, so a hung
//! request can never build an unbounded backlog (the source is expected to
//! carry its own request timeout).
//!
//! Cancellation is synchronous: dropping or stopping the session aborts the
//! task, which clears any pending sleep. A response that would have resolved
//! after deactivation is discarded with the task — late snapshots can never
//! reach subscribers of a dead session.
//!
//! [`SessionSlot`] enforces the one-session-per-view rule: re-tracking the id
//! already being tracked is a no-op, and selecting a different id aborts the
//! previous session before the new one starts.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::job::{JobCounters, JobSnapshot};
use crate::policy::{NotFoundPolicy, PollPolicy};
use crate::tracker::{TrackEffect, TrackEvent, Tracker};

/// Fetches the latest snapshot for a job id.
///
/// `Ok(None)` means the backend reported the id as not found — right after
/// job creation this is expected and recovered via [`NotFoundPolicy`].
/// `Err` is a transport/HTTP failure and halts the session.
#[async_trait::async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_status(&self, job_id: &str) -> anyhow::Result<Option<JobSnapshot>>;
}

/// Updates delivered by a session, in order.
#[derive(Debug, Clone)]
pub enum TrackUpdate {
    /// A fresh snapshot (live or terminal).
    Snapshot(JobSnapshot),
    /// The job reached a terminal state. Sent exactly once, after the final
    /// snapshot; the session stops afterwards. History listers refresh on
    /// this signal.
    Settled(JobSnapshot),
    /// The job id never became visible within the not-found budget.
    NotFound { job_id: String, attempts: u32 },
    /// A fetch failed; the session stopped.
    Error { job_id: String, message: String },
}

/// Handle to one live polling task. Dropping it cancels the task.
#[derive(Debug)]
pub struct PollingSession {
    job_id: String,
    task: JoinHandle<()>,
}

impl PollingSession {
    /// Spawn a session for `job_id`. Returns the handle and the update
    /// stream. The first fetch is issued immediately.
    pub fn start(
        job_id: impl Into<String>,
        source: Arc<dyn StatusSource>,
        not_found: NotFoundPolicy,
        poll: PollPolicy,
    ) -> (Self, mpsc::UnboundedReceiver<TrackUpdate>) {
        let job_id = job_id.into();
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(job_id.clone(), source, not_found, poll, tx));
        (Self { job_id, task }, rx)
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// True once the session has stopped on its own (settled, not found, or
    /// errored).
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Deactivate: abort the task and clear any pending timer.
    pub fn stop(self) {
        self.task.abort();
    }
}

impl Drop for PollingSession {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(
    job_id: String,
    source: Arc<dyn StatusSource>,
    not_found: NotFoundPolicy,
    poll: PollPolicy,
    tx: mpsc::UnboundedSender<TrackUpdate>,
) {
    let mut tracker = Tracker::new(not_found, poll);
    let mut last_counters: Option<JobCounters> = None;
    let mut effects = tracker.step(TrackEvent::Activate);

    loop {
        let mut delay = None;
        let mut fetch_now = false;
        let mut done = false;

        for effect in effects.drain(..) {
            match effect {
                TrackEffect::FetchNow => fetch_now = true,
                TrackEffect::RetryAfter(d) | TrackEffect::PollAfter(d) => delay = Some(d),
                TrackEffect::Publish(snapshot) => {
                    check_counters(&job_id, &mut last_counters, &snapshot);
                    let _ = tx.send(TrackUpdate::Snapshot(snapshot));
                }
                TrackEffect::Settle(snapshot) => {
                    debug!(job_id = %job_id, status = %snapshot.status, "job settled");
                    let _ = tx.send(TrackUpdate::Settled(snapshot));
                    done = true;
                }
                TrackEffect::ReportNotFound { attempts } => {
                    warn!(job_id = %job_id, attempts, "job never became visible");
                    let _ = tx.send(TrackUpdate::NotFound {
                        job_id: job_id.clone(),
                        attempts,
                    });
                    done = true;
                }
                TrackEffect::ReportError(message) => {
                    warn!(job_id = %job_id, error = %message, "status fetch failed, polling halted");
                    let _ = tx.send(TrackUpdate::Error {
                        job_id: job_id.clone(),
                        message,
                    });
                    done = true;
                }
            }
        }

        if done {
            return;
        }
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
            fetch_now = true;
        }
        if !fetch_now {
            // No scheduling effect means the tracker has nothing left to do.
            return;
        }

        let event = match source.fetch_status(&job_id).await {
            Ok(Some(snapshot)) => TrackEvent::Snapshot(snapshot),
            Ok(None) => TrackEvent::NotVisible,
            Err(e) => TrackEvent::Failed(e.to_string()),
        };
        effects = tracker.step(event);
    }
}

/// Counters are monotonically non-decreasing while a job is live. The client
/// never writes them, so a regression indicates a backend anomaly; keep the
/// snapshot but make the anomaly visible in the logs.
fn check_counters(job_id: &str, last: &mut Option<JobCounters>, snapshot: &JobSnapshot) {
    if !snapshot.counters.is_consistent() {
        warn!(
            job_id = %job_id,
            total = snapshot.counters.total,
            succeeded = snapshot.counters.succeeded,
            failed = snapshot.counters.failed,
            "counters exceed total"
        );
    }
    if let Some(prev) = last {
        if snapshot.counters.processed() < prev.processed() {
            warn!(
                job_id = %job_id,
                previous = prev.processed(),
                current = snapshot.counters.processed(),
                "counters regressed between snapshots"
            );
        }
    }
    *last = Some(snapshot.counters);
}

/// Holds at most one live session for a view.
///
/// Guarantees that activating a tracker twice in quick succession for the
/// same id never produces two concurrent polling loops, and that switching
/// ids aborts the old session before the new one begins.
#[derive(Debug, Default)]
pub struct SessionSlot {
    current: Option<PollingSession>,
}

impl SessionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking `job_id`. Returns `None` when a live session for this
    /// exact id already exists (no duplicate polling); otherwise replaces any
    /// previous session and returns the new update stream.
    pub fn track(
        &mut self,
        job_id: &str,
        source: Arc<dyn StatusSource>,
        not_found: NotFoundPolicy,
        poll: PollPolicy,
    ) -> Option<mpsc::UnboundedReceiver<TrackUpdate>> {
        if let Some(current) = &self.current {
            if current.job_id() == job_id && !current.is_finished() {
                debug!(job_id, "already tracking, ignoring duplicate activation");
                return None;
            }
        }
        if let Some(previous) = self.current.take() {
            previous.stop();
        }
        let (session, rx) = PollingSession::start(job_id, source, not_found, poll);
        self.current = Some(session);
        Some(rx)
    }

    /// Id currently being tracked, if any.
    pub fn active_job(&self) -> Option<&str> {
        self.current.as_ref().map(|s| s.job_id())
    }

    /// Deactivate whatever is being tracked.
    pub fn clear(&mut self) {
        if let Some(session) = self.current.take() {
            session.stop();
        }
    }
}
