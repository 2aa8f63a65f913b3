//! `ops audit` subcommands.
//!
//! The last started or selected audit id is persisted in the session state
//! file so `watch` and `cleanup` can default to it across CLI invocations.

use std::sync::Arc;

use anyhow::{bail, Result};
use clap::Subcommand;
use colored::Colorize;
use dialoguer::Confirm;

use pulse::{HistoryLister, JobKind, PollPolicy};
use tgadmin_api::{AuditJobs, CleanupJobs, TgAdminClient};

use crate::broadcast::print_history;
use crate::config::Config;
use crate::state::SessionStore;
use crate::watch::{self, WatchOutcome};

#[derive(Debug, Subcommand)]
pub enum AuditCmd {
    /// Start a membership audit across all managed channels and watch it
    Start,
    /// Watch an audit (defaults to the last one started)
    Watch { audit_uuid: Option<String> },
    /// List past audits
    History,
    /// Remove expired members found by an audit from one channel
    Cleanup {
        channel_id: i64,
        /// Audit to act on (defaults to the last one started)
        #[arg(long)]
        audit_uuid: Option<String>,
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

pub async fn run(
    cmd: AuditCmd,
    client: Arc<TgAdminClient>,
    config: &Config,
    store: Option<SessionStore>,
) -> Result<()> {
    let jobs = AuditJobs::new(Arc::clone(&client));
    let poll = PollPolicy::new(config.poll_interval);

    match cmd {
        AuditCmd::Start => {
            let created = client.create_audit().await?;
            println!("{} {}", "audit started:".bold(), created.audit_uuid);
            if let Some(store) = &store {
                store.remember_audit(&created.audit_uuid);
            }

            let outcome = watch::watch(&created.audit_uuid, Arc::new(jobs), poll).await?;
            watch::print_outcome(&outcome);
            if matches!(outcome, WatchOutcome::Settled(_)) {
                print_channel_results(&client, &created.audit_uuid).await?;
            }
        }

        AuditCmd::Watch { audit_uuid } => {
            let audit_uuid = resolve_audit(audit_uuid, &store)?;
            if let Some(store) = &store {
                store.remember_audit(&audit_uuid);
            }

            let outcome = watch::watch(&audit_uuid, Arc::new(jobs), poll).await?;
            watch::print_outcome(&outcome);
            match &outcome {
                WatchOutcome::Settled(_) => {
                    print_channel_results(&client, &audit_uuid).await?;
                }
                WatchOutcome::NotFound { .. } => {
                    // The stored id points at nothing; forget it.
                    if let Some(store) = &store {
                        store.clear_audit();
                        println!("{}", "cleared stored audit id".dimmed());
                    }
                }
                WatchOutcome::Failed { .. } => {}
            }
        }

        AuditCmd::History => {
            let mut lister = HistoryLister::new(jobs, JobKind::ChannelAudit);
            let history = lister.current().await?;
            print_history(&history);
        }

        AuditCmd::Cleanup {
            channel_id,
            audit_uuid,
            yes,
        } => {
            let audit_uuid = resolve_audit(audit_uuid, &store)?;

            let users = client.removable_users(&audit_uuid, channel_id).await?;
            if users.is_empty() {
                println!("{}", "nothing to remove in this channel".green());
                return Ok(());
            }

            println!(
                "{}",
                format!("{} members with no active subscription:", users.len()).bold()
            );
            for user in &users {
                let name = user
                    .username
                    .as_deref()
                    .or(user.full_name.as_deref())
                    .unwrap_or("-");
                println!("  {} {}", user.user_id, name.dimmed());
            }

            if !yes
                && !Confirm::new()
                    .with_prompt(format!("Remove {} members from {channel_id}?", users.len()))
                    .default(false)
                    .interact()?
            {
                println!("{}", "aborted".dimmed());
                return Ok(());
            }

            let started = client.start_cleanup(&audit_uuid, channel_id).await?;
            println!("{} {}", "cleanup batch:".bold(), started.batch_id);

            let cleanup = CleanupJobs::new(Arc::clone(&client));
            let outcome = watch::watch(&started.batch_id, Arc::new(cleanup), poll).await?;
            watch::print_outcome(&outcome);
        }
    }

    Ok(())
}

fn resolve_audit(arg: Option<String>, store: &Option<SessionStore>) -> Result<String> {
    if let Some(uuid) = arg {
        return Ok(uuid);
    }
    if let Some(uuid) = store.as_ref().and_then(|s| s.last_audit()) {
        println!("{} {}", "using last audit:".dimmed(), uuid);
        return Ok(uuid);
    }
    bail!("no audit id given and none stored; run `ops audit start` first");
}

/// The per-channel breakdown only exists on the audit endpoint, so fetch the
/// settled audit once more for its `channel_results`.
async fn print_channel_results(client: &TgAdminClient, audit_uuid: &str) -> Result<()> {
    let Some(status) = client.audit_status(audit_uuid).await? else {
        return Ok(());
    };
    if status.channel_results.is_empty() {
        return Ok(());
    }
    println!("{}", "channel results:".bold());
    for result in &status.channel_results {
        let name = result.channel_name.as_deref().unwrap_or("-");
        let removable = if result.removable_members > 0 {
            result.removable_members.to_string().yellow()
        } else {
            result.removable_members.to_string().green()
        };
        println!(
            "  {} {}  checked {}, removable {}",
            result.channel_id,
            name.dimmed(),
            result.checked_members,
            removable,
        );
    }
    println!(
        "{}",
        "run `ops audit cleanup <channel_id>` to remove expired members".dimmed()
    );
    Ok(())
}
