//! CLI configuration loaded from environment variables.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub token: String,
    pub poll_interval: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let poll_interval_ms: u64 = env::var("TGADMIN_POLL_INTERVAL_MS")
            .unwrap_or_else(|_| "5000".to_string())
            .parse()
            .context("TGADMIN_POLL_INTERVAL_MS must be a valid number")?;

        Ok(Self {
            base_url: env::var("TGADMIN_BASE_URL").context("TGADMIN_BASE_URL must be set")?,
            token: env::var("TGADMIN_API_TOKEN").context("TGADMIN_API_TOKEN must be set")?,
            poll_interval: Duration::from_millis(poll_interval_ms),
        })
    }
}
