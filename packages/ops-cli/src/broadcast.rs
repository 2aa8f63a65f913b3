//! `ops broadcast` subcommands.

use std::sync::Arc;

use anyhow::{bail, Result};
use clap::Subcommand;
use colored::Colorize;

use pulse::{DetailViewer, HistoryLister, HistoryPage, JobKind, JobSnapshot, PollPolicy};
use tgadmin_api::{BroadcastJobs, TgAdminClient};

use crate::config::Config;
use crate::watch::{self, WatchOutcome};

#[derive(Debug, Subcommand)]
pub enum BroadcastCmd {
    /// Start a broadcast and watch it to completion
    Send {
        /// Message text to send
        #[arg(long)]
        message: String,
        /// Target segment (e.g. "all", "active", "expiring")
        #[arg(long)]
        target: String,
        /// Restrict to one subscription type
        #[arg(long)]
        subscription_type: Option<i64>,
    },
    /// Watch an existing batch until it settles
    Watch { batch_id: String },
    /// Show the per-recipient error breakdown for a batch
    Detail { batch_id: String },
    /// Re-send to the failed recipients and watch the new batch
    Retry { batch_id: String },
    /// List past broadcasts
    History {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        page_size: u32,
    },
}

pub async fn run(cmd: BroadcastCmd, client: Arc<TgAdminClient>, config: &Config) -> Result<()> {
    let jobs = BroadcastJobs::new(Arc::clone(&client));
    let poll = PollPolicy::new(config.poll_interval);

    match cmd {
        BroadcastCmd::Send {
            message,
            target,
            subscription_type,
        } => {
            // Validation failures never reach the backend.
            if message.trim().is_empty() {
                bail!("message must not be empty");
            }
            if target.trim().is_empty() {
                bail!("target segment must not be empty");
            }

            let created = client
                .create_broadcast(&message, &target, subscription_type)
                .await?;
            println!("{} {}", "batch created:".bold(), created.batch_id);

            let outcome = watch::watch(&created.batch_id, Arc::new(jobs.clone()), poll).await?;
            watch::print_outcome(&outcome);
            print_recent(jobs).await;
        }

        BroadcastCmd::Watch { batch_id } => {
            let outcome = watch::watch(&batch_id, Arc::new(jobs.clone()), poll).await?;
            watch::print_outcome(&outcome);
            if matches!(outcome, WatchOutcome::Settled(_)) {
                print_recent(jobs).await;
            }
        }

        BroadcastCmd::Detail { batch_id } => {
            let viewer = DetailViewer::new(jobs);
            let detail = viewer.load(&batch_id).await?;
            println!("{}", watch::render_line(&detail.snapshot));

            // Omit the summary panel entirely when there is nothing in it.
            if !detail.snapshot.error_summary.is_empty() {
                println!("{}", "error summary:".bold());
                for (code, count) in &detail.snapshot.error_summary {
                    println!("  {code}: {count}");
                }
            }

            if detail.failures.is_empty() {
                println!("{}", "no failures".green());
            } else {
                println!("{}", "failures:".bold());
                for f in &detail.failures {
                    let marker = if f.is_retryable {
                        "retryable".yellow()
                    } else {
                        "permanent".dimmed()
                    };
                    println!("  {} {} ({marker})", f.recipient_ref, f.error_message);
                }
                if detail.has_retryable_failures() {
                    println!(
                        "{}",
                        format!("run `ops broadcast retry {batch_id}` to re-send").dimmed()
                    );
                }
            }
        }

        BroadcastCmd::Retry { batch_id } => {
            let viewer = DetailViewer::new(jobs.clone());
            let started = viewer.retry_failed(&batch_id).await?;
            if let Some(msg) = &started.message {
                println!("{msg}");
            }
            println!("{} {}", "retry batch:".bold(), started.new_job_id);

            // The retry is a brand-new job; track it from scratch.
            let outcome = watch::watch(&started.new_job_id, Arc::new(jobs.clone()), poll).await?;
            watch::print_outcome(&outcome);
            print_recent(jobs).await;
        }

        BroadcastCmd::History { page, page_size } => {
            let mut lister = HistoryLister::new(jobs, JobKind::Broadcast);
            lister.set_page_size(page_size);
            lister.set_page(page);
            let history = lister.current().await?;
            print_history(&history);
        }
    }

    Ok(())
}

/// After a tracked job settles the history is stale; show the fresh view.
async fn print_recent(jobs: BroadcastJobs) {
    let mut lister = HistoryLister::new(jobs, JobKind::Broadcast);
    lister.on_job_settled();
    match lister.refresh().await {
        Ok(history) => {
            println!();
            println!("{}", "recent broadcasts:".bold());
            print_history(&history);
        }
        Err(e) => {
            // History being briefly unavailable never fails the command.
            println!("{} {e}", "could not refresh history:".yellow());
        }
    }
}

pub fn print_history(history: &HistoryPage<JobSnapshot>) {
    if history.items.is_empty() {
        println!("{}", "no jobs on this page".dimmed());
        return;
    }
    for snapshot in &history.items {
        let when = snapshot
            .created_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("  {}  {}  {}", when.dimmed(), snapshot.id, watch::render_line(snapshot));
    }
    println!(
        "{}",
        format!(
            "page {}/{} ({} total)",
            history.page,
            history.page_count().max(1),
            history.total
        )
        .dimmed()
    );
}
