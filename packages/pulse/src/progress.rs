//! Pure progress presentation: badge mapping and percentage math.
//!
//! Everything here is a pure function of a snapshot. No IO, no state, safe to
//! re-evaluate on every poll tick. Unknown statuses render a neutral badge
//! with the raw status text; nothing here panics or renders blank.

use crate::job::{JobCounters, JobSnapshot};
use crate::status::JobStatus;

/// Visual weight of a status badge. Presentation-agnostic: the CLI maps
/// these to colors, a different frontend could map them to CSS classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Badge {
    /// Pending, or anything unrecognized.
    Neutral,
    /// Actively in progress.
    Info,
    /// Completed.
    Success,
    /// Failed.
    Danger,
    /// Cancelled.
    Muted,
}

/// Map a status to its badge. Total: every [`JobStatus`] variant is covered.
pub fn badge(status: &JobStatus) -> Badge {
    match status {
        JobStatus::Pending => Badge::Neutral,
        JobStatus::InProgress => Badge::Info,
        JobStatus::Completed => Badge::Success,
        JobStatus::Failed => Badge::Danger,
        JobStatus::Cancelled => Badge::Muted,
        JobStatus::Unknown(_) => Badge::Neutral,
    }
}

/// Percentage of recipients processed, in `[0, 100]`.
///
/// Exactly `0.0` when `total == 0` — never NaN, never a division error.
/// Clamped so inconsistent counters (`processed > total`) cannot exceed 100.
pub fn percent(counters: &JobCounters) -> f64 {
    if counters.total == 0 {
        return 0.0;
    }
    let pct = counters.processed() as f64 / counters.total as f64 * 100.0;
    pct.clamp(0.0, 100.0)
}

/// Assembled render model for one snapshot tick.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressView {
    /// True while no snapshot has arrived yet.
    pub loading: bool,
    pub label: String,
    pub badge: Badge,
    pub counters: JobCounters,
    pub percent: f64,
}

impl ProgressView {
    pub fn from_snapshot(snapshot: Option<&JobSnapshot>) -> Self {
        match snapshot {
            None => Self {
                loading: true,
                label: "loading".to_string(),
                badge: Badge::Neutral,
                counters: JobCounters::default(),
                percent: 0.0,
            },
            Some(s) => Self {
                loading: false,
                label: s.status.label().to_string(),
                badge: badge(&s.status),
                counters: s.counters,
                percent: percent(&s.counters),
            },
        }
    }
}
