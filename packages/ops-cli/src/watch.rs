//! Live progress watching: one polling session rendered to the terminal.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use colored::Colorize;

use pulse::{
    Badge, JobSnapshot, NotFoundPolicy, PollPolicy, ProgressView, SessionSlot, StatusSource,
    TrackUpdate,
};

/// How a watched job ended.
#[derive(Debug)]
pub enum WatchOutcome {
    /// The job reached a terminal state.
    Settled(JobSnapshot),
    /// The id never became visible within the not-found budget.
    NotFound { job_id: String, attempts: u32 },
    /// A fetch failed and polling halted.
    Failed { job_id: String, message: String },
}

/// Poll `job_id` until it settles, rendering each snapshot as a line.
pub async fn watch(
    job_id: &str,
    source: Arc<dyn StatusSource>,
    poll: PollPolicy,
) -> Result<WatchOutcome> {
    let mut slot = SessionSlot::new();
    let mut rx = slot
        .track(job_id, source, NotFoundPolicy::default(), poll)
        .ok_or_else(|| anyhow!("a session for {job_id} is already active"))?;

    println!("{} {}", "watching".dimmed(), job_id.bold());
    while let Some(update) = rx.recv().await {
        match update {
            TrackUpdate::Snapshot(snapshot) => {
                println!("{}", render_line(&snapshot));
            }
            TrackUpdate::Settled(snapshot) => {
                return Ok(WatchOutcome::Settled(snapshot));
            }
            TrackUpdate::NotFound { job_id, attempts } => {
                return Ok(WatchOutcome::NotFound { job_id, attempts });
            }
            TrackUpdate::Error { job_id, message } => {
                return Ok(WatchOutcome::Failed { job_id, message });
            }
        }
    }
    Err(anyhow!("polling session ended unexpectedly"))
}

/// One progress line: badge, counters, percentage bar.
pub fn render_line(snapshot: &JobSnapshot) -> String {
    let view = ProgressView::from_snapshot(Some(snapshot));
    format!(
        "  {} {} {}/{} ok, {} failed ({:.0}%)",
        badge_label(&view),
        bar(view.percent),
        view.counters.succeeded,
        view.counters.total,
        view.counters.failed,
        view.percent,
    )
}

fn badge_label(view: &ProgressView) -> colored::ColoredString {
    let label = format!("[{}]", view.label);
    match view.badge {
        Badge::Success => label.green(),
        Badge::Danger => label.red(),
        Badge::Info => label.cyan(),
        Badge::Muted => label.dimmed(),
        Badge::Neutral => label.normal(),
    }
}

fn bar(percent: f64) -> String {
    const WIDTH: usize = 20;
    let filled = ((percent / 100.0) * WIDTH as f64).round() as usize;
    let filled = filled.min(WIDTH);
    format!("{}{}", "█".repeat(filled), "░".repeat(WIDTH - filled))
}

/// Print the final state of a settled job.
pub fn print_outcome(outcome: &WatchOutcome) {
    match outcome {
        WatchOutcome::Settled(snapshot) => {
            println!("{}", render_line(snapshot));
            match snapshot.status {
                pulse::JobStatus::Completed => {
                    println!("{} {}", "done:".green().bold(), snapshot.id)
                }
                pulse::JobStatus::Failed => {
                    println!("{} {}", "job failed:".red().bold(), snapshot.id)
                }
                _ => println!("{} {} ({})", "finished:".bold(), snapshot.id, snapshot.status),
            }
        }
        WatchOutcome::NotFound { job_id, attempts } => {
            println!(
                "{} {job_id} was never visible (gave up after {attempts} retries)",
                "not found:".yellow().bold()
            );
        }
        WatchOutcome::Failed { job_id, message } => {
            println!("{} {job_id}: {message}", "poll error:".red().bold());
        }
    }
}
