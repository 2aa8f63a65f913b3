//! # Pulse
//!
//! Client-side tracking of long-running backend batch jobs: broadcast sends,
//! channel audits, and channel cleanups. The backend runs the job; pulse
//! watches it — one normalized job model, one polling lifecycle, one set of
//! policies — instead of each screen growing its own interval loop.
//!
//! ## Architecture
//!
//! ```text
//! initiator (CLI / UI action)
//!     │ create job ─► backend returns id
//!     ▼
//! SessionSlot ── at most one live session per view
//!     │
//!     ▼
//! PollingSession (async driver, owns one tokio task)
//!     │ feeds events
//!     ▼
//! Tracker (pure state machine: Idle → InitialFetch → Polling → Settled)
//!     │ effects
//!     ├─► fetch via StatusSource        (adapter over the REST client)
//!     ├─► TrackUpdate::Snapshot ──► ProgressView (pure rendering)
//!     └─► TrackUpdate::Settled  ──► HistoryLister refresh
//! ```
//!
//! ## Key invariants
//!
//! 1. **One session per job id per view** — `SessionSlot` rejects duplicate
//!    activation and aborts the old session when the id changes.
//! 2. **Terminal is forever** — after a terminal snapshot no further fetch is
//!    scheduled for that session; the settle signal fires exactly once.
//! 3. **Two policies, never merged** — the bounded not-found retry
//!    (5 × 1500 ms) and the steady poll cadence (5 s) have different delays
//!    and different failure semantics by observation.
//! 4. **Normalization at the boundary** — per-kind status vocabularies are
//!    mapped to one `JobStatus` before anything else sees them; unrecognized
//!    statuses become `Unknown`, never a guess.
//! 5. **No panics in the tracking path** — errors surface as `TrackError`
//!    or as `TrackUpdate` variants; a failed poll for one job never affects
//!    another view.

pub mod cache;
pub mod detail;
pub mod error;
pub mod history;
pub mod job;
pub mod policy;
pub mod progress;
pub mod session;
pub mod status;
pub mod tracker;

pub use cache::TtlCache;
pub use detail::{DetailSource, DetailViewer, RetryGate, RetryGuard};
pub use error::{Result, TrackError};
pub use history::{HistoryLister, HistorySource};
pub use job::{HistoryPage, JobCounters, JobDetail, JobSnapshot, RecipientFailure, RetryStarted};
pub use policy::{NotFoundPolicy, PollPolicy};
pub use progress::{badge, percent, Badge, ProgressView};
pub use session::{PollingSession, SessionSlot, StatusSource, TrackUpdate};
pub use status::{JobKind, JobStatus};
pub use tracker::{TrackEffect, TrackEvent, Tracker, TrackerState};
