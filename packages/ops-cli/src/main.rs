//! Operator CLI for the subscription-bot backend.
//!
//! Starts and tracks the backend's long-running batch jobs: message
//! broadcasts, channel membership audits, and channel cleanups.

mod audit;
mod broadcast;
mod config;
mod state;
mod watch;

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tgadmin_api::TgAdminClient;

use audit::AuditCmd;
use broadcast::BroadcastCmd;
use config::Config;
use state::SessionStore;

#[derive(Parser)]
#[command(name = "ops", about = "Operate broadcasts, audits, and cleanups", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Message broadcasts to user segments
    Broadcast {
        #[command(subcommand)]
        cmd: BroadcastCmd,
    },
    /// Channel membership audits and cleanups
    Audit {
        #[command(subcommand)]
        cmd: AuditCmd,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let client = Arc::new(TgAdminClient::new(
        config.base_url.clone(),
        config.token.clone(),
    ));

    match cli.command {
        Commands::Broadcast { cmd } => broadcast::run(cmd, client, &config).await,
        Commands::Audit { cmd } => {
            let store = SessionStore::open_default();
            audit::run(cmd, client, &config, store).await
        }
    }
}
