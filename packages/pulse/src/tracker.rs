//! Pure tracking state machine for one job view.
//!
//! The tracker interprets fetch outcomes and decides what to do next; it owns
//! its state, performs no IO, and is fully synchronous. The async driver
//! ([`crate::session::PollingSession`]) feeds it events and executes the
//! effects it returns. Keeping the machine pure makes every transition in the
//! lifecycle unit-testable without timers or a runtime.
//!
//! ```text
//! [Idle] --activate--> [InitialFetch]
//! [InitialFetch] --snapshot terminal--> [Settled]
//! [InitialFetch] --snapshot live--> [Polling]
//! [InitialFetch] --not visible, retries left--> [InitialFetch] (after delay)
//! [InitialFetch] --not visible, budget spent--> [NotFound]
//! [Polling] --snapshot terminal--> [Settled]  (settle signal fires once)
//! [Polling] --fetch error--> [FetchError]
//! [any] --deactivate--> [Idle]
//! ```

use std::time::Duration;

use crate::job::JobSnapshot;
use crate::policy::{NotFoundPolicy, PollPolicy};

/// Tracker lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerState {
    /// No job selected.
    Idle,
    /// Waiting for the first visible snapshot. `retries` counts delayed
    /// re-fetches already spent (the immediate first fetch is not a retry).
    InitialFetch { retries: u32 },
    /// Live job; recurring fetches scheduled at the poll interval.
    Polling,
    /// Terminal snapshot received; no further fetch will ever be scheduled.
    Settled,
    /// The job id never became visible within the not-found budget.
    NotFound,
    /// A fetch failed; polling halted (re-selection starts over).
    FetchError,
}

/// Fetch outcomes and control inputs fed to the tracker.
#[derive(Debug, Clone)]
pub enum TrackEvent {
    /// Select a job and begin tracking it.
    Activate,
    /// A snapshot arrived.
    Snapshot(JobSnapshot),
    /// The backend reported the id as not found (404).
    NotVisible,
    /// The fetch itself failed (network/HTTP error other than not-found).
    Failed(String),
    /// Unmount, id change, or explicit stop.
    Deactivate,
}

/// IO requests emitted by the tracker for the driver to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackEffect {
    /// Fetch the job status immediately.
    FetchNow,
    /// Fetch again after the not-found retry delay.
    RetryAfter(Duration),
    /// Fetch again after the steady-state poll interval.
    PollAfter(Duration),
    /// Deliver a snapshot to subscribers.
    Publish(JobSnapshot),
    /// The job reached a terminal state. Fired exactly once per session;
    /// carries the history-refresh signal.
    Settle(JobSnapshot),
    /// The not-found budget is spent; surface the condition and stop.
    ReportNotFound { attempts: u32 },
    /// Surface a fetch error and stop.
    ReportError(String),
}

/// Pure state machine driving one tracked job view.
#[derive(Debug)]
pub struct Tracker {
    state: TrackerState,
    not_found: NotFoundPolicy,
    poll: PollPolicy,
}

impl Tracker {
    pub fn new(not_found: NotFoundPolicy, poll: PollPolicy) -> Self {
        Self {
            state: TrackerState::Idle,
            not_found,
            poll,
        }
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    /// Feed one event; returns the effects to execute, in order.
    ///
    /// Events that do not apply to the current state (a late snapshot after
    /// settling, a stray not-visible while idle) produce no effects — the
    /// stale-response guard lives here, not in the driver.
    pub fn step(&mut self, event: TrackEvent) -> Vec<TrackEffect> {
        match (&self.state, event) {
            (TrackerState::Idle, TrackEvent::Activate) => {
                self.state = TrackerState::InitialFetch { retries: 0 };
                vec![TrackEffect::FetchNow]
            }

            (TrackerState::InitialFetch { .. } | TrackerState::Polling, TrackEvent::Snapshot(s)) => {
                if s.is_terminal() {
                    self.state = TrackerState::Settled;
                    vec![TrackEffect::Publish(s.clone()), TrackEffect::Settle(s)]
                } else {
                    self.state = TrackerState::Polling;
                    vec![
                        TrackEffect::Publish(s),
                        TrackEffect::PollAfter(self.poll.interval),
                    ]
                }
            }

            (TrackerState::InitialFetch { retries }, TrackEvent::NotVisible) => {
                let retries = *retries;
                if retries < self.not_found.max_attempts {
                    self.state = TrackerState::InitialFetch { retries: retries + 1 };
                    vec![TrackEffect::RetryAfter(self.not_found.delay)]
                } else {
                    self.state = TrackerState::NotFound;
                    vec![TrackEffect::ReportNotFound { attempts: retries }]
                }
            }

            // A 404 mid-poll means the job vanished server-side; treat it as
            // a fetch error rather than restarting the not-found budget.
            (TrackerState::Polling, TrackEvent::NotVisible) => {
                self.state = TrackerState::FetchError;
                vec![TrackEffect::ReportError("job disappeared while polling".to_string())]
            }

            (TrackerState::InitialFetch { .. } | TrackerState::Polling, TrackEvent::Failed(msg)) => {
                self.state = TrackerState::FetchError;
                vec![TrackEffect::ReportError(msg)]
            }

            (_, TrackEvent::Deactivate) => {
                self.state = TrackerState::Idle;
                vec![]
            }

            // Terminal states and Idle ignore everything else.
            _ => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobCounters;
    use crate::status::{JobKind, JobStatus};
    use std::collections::BTreeMap;

    fn tracker() -> Tracker {
        Tracker::new(NotFoundPolicy::default(), PollPolicy::default())
    }

    fn snap(status: JobStatus) -> JobSnapshot {
        JobSnapshot {
            id: "b-1".into(),
            kind: JobKind::Broadcast,
            status,
            counters: JobCounters::new(100, 40, 5),
            created_at: None,
            started_at: None,
            completed_at: None,
            error_summary: BTreeMap::new(),
        }
    }

    #[test]
    fn test_activate_fetches_immediately() {
        let mut t = tracker();
        let effects = t.step(TrackEvent::Activate);
        assert_eq!(effects, vec![TrackEffect::FetchNow]);
        assert_eq!(*t.state(), TrackerState::InitialFetch { retries: 0 });
    }

    #[test]
    fn test_live_snapshot_enters_polling() {
        let mut t = tracker();
        t.step(TrackEvent::Activate);
        let effects = t.step(TrackEvent::Snapshot(snap(JobStatus::InProgress)));
        assert_eq!(
            effects,
            vec![
                TrackEffect::Publish(snap(JobStatus::InProgress)),
                TrackEffect::PollAfter(PollPolicy::default().interval),
            ]
        );
        assert_eq!(*t.state(), TrackerState::Polling);
    }

    #[test]
    fn test_terminal_on_first_fetch_never_schedules() {
        // Selecting an already-completed job from history: one fetch, no
        // interval, settle signal fires.
        let mut t = tracker();
        t.step(TrackEvent::Activate);
        let effects = t.step(TrackEvent::Snapshot(snap(JobStatus::Completed)));
        assert_eq!(
            effects,
            vec![
                TrackEffect::Publish(snap(JobStatus::Completed)),
                TrackEffect::Settle(snap(JobStatus::Completed)),
            ]
        );
        assert_eq!(*t.state(), TrackerState::Settled);
    }

    #[test]
    fn test_settled_ignores_late_snapshots() {
        let mut t = tracker();
        t.step(TrackEvent::Activate);
        t.step(TrackEvent::Snapshot(snap(JobStatus::Completed)));
        // A stale response arriving after settlement must not re-schedule.
        assert!(t.step(TrackEvent::Snapshot(snap(JobStatus::InProgress))).is_empty());
        assert_eq!(*t.state(), TrackerState::Settled);
    }

    #[test]
    fn test_bounded_not_found_retries() {
        let mut t = tracker();
        t.step(TrackEvent::Activate);

        // Exactly 5 delayed retries are granted after the immediate fetch.
        for i in 1..=5 {
            let effects = t.step(TrackEvent::NotVisible);
            assert_eq!(
                effects,
                vec![TrackEffect::RetryAfter(NotFoundPolicy::default().delay)],
                "retry {i} should be granted"
            );
        }

        // The 6th miss exhausts the budget.
        let effects = t.step(TrackEvent::NotVisible);
        assert_eq!(effects, vec![TrackEffect::ReportNotFound { attempts: 5 }]);
        assert_eq!(*t.state(), TrackerState::NotFound);
    }

    #[test]
    fn test_sixth_response_is_accepted_after_five_misses() {
        let mut t = tracker();
        t.step(TrackEvent::Activate);
        for _ in 0..5 {
            t.step(TrackEvent::NotVisible);
        }
        let effects = t.step(TrackEvent::Snapshot(snap(JobStatus::InProgress)));
        assert_eq!(*t.state(), TrackerState::Polling);
        assert!(matches!(effects[0], TrackEffect::Publish(_)));
    }

    #[test]
    fn test_fetch_error_halts_polling() {
        let mut t = tracker();
        t.step(TrackEvent::Activate);
        t.step(TrackEvent::Snapshot(snap(JobStatus::InProgress)));
        let effects = t.step(TrackEvent::Failed("connection reset".into()));
        assert_eq!(effects, vec![TrackEffect::ReportError("connection reset".into())]);
        assert_eq!(*t.state(), TrackerState::FetchError);
        // No retry after a fetch error; re-selection starts a fresh session.
        assert!(t.step(TrackEvent::Snapshot(snap(JobStatus::InProgress))).is_empty());
    }

    #[test]
    fn test_vanished_mid_poll_is_an_error_not_a_retry() {
        let mut t = tracker();
        t.step(TrackEvent::Activate);
        t.step(TrackEvent::Snapshot(snap(JobStatus::InProgress)));
        let effects = t.step(TrackEvent::NotVisible);
        assert!(matches!(effects[0], TrackEffect::ReportError(_)));
        assert_eq!(*t.state(), TrackerState::FetchError);
    }

    #[test]
    fn test_deactivate_from_any_state() {
        for setup in [
            vec![],
            vec![TrackEvent::Activate],
            vec![
                TrackEvent::Activate,
                TrackEvent::Snapshot(snap(JobStatus::InProgress)),
            ],
            vec![
                TrackEvent::Activate,
                TrackEvent::Snapshot(snap(JobStatus::Completed)),
            ],
        ] {
            let mut t = tracker();
            for ev in setup {
                t.step(ev);
            }
            assert!(t.step(TrackEvent::Deactivate).is_empty());
            assert_eq!(*t.state(), TrackerState::Idle);
        }
    }

    #[test]
    fn test_settle_fires_exactly_once() {
        let mut t = tracker();
        t.step(TrackEvent::Activate);
        t.step(TrackEvent::Snapshot(snap(JobStatus::InProgress)));
        let effects = t.step(TrackEvent::Snapshot(snap(JobStatus::Failed)));
        let settles = effects
            .iter()
            .filter(|e| matches!(e, TrackEffect::Settle(_)))
            .count();
        assert_eq!(settles, 1);
        // Further terminal snapshots do not re-fire.
        assert!(t.step(TrackEvent::Snapshot(snap(JobStatus::Failed))).is_empty());
    }

    #[test]
    fn test_failed_status_is_settlement_not_error() {
        // status = failed is a valid terminal state, distinct from a client
        // fetch failure.
        let mut t = tracker();
        t.step(TrackEvent::Activate);
        let effects = t.step(TrackEvent::Snapshot(snap(JobStatus::Failed)));
        assert!(effects.iter().any(|e| matches!(e, TrackEffect::Settle(_))));
        assert_eq!(*t.state(), TrackerState::Settled);
    }
}
