//! Runtime settings derived from the command line.

use crate::cache::DEFAULT_TTL_SECS;
use crate::cli::Cli;
use chrono::Duration;
use std::time::Duration as StdDuration;

pub const DEFAULT_USER_AGENT: &str = concat!("scrape_feed/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub store_dir: String,
    pub ttl: Duration,
    pub workers: usize,
    pub fetch_timeout: StdDuration,
    pub user_agent: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_dir: "./feed_store".to_string(),
            ttl: Duration::seconds(DEFAULT_TTL_SECS),
            workers: 4,
            fetch_timeout: StdDuration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl From<&Cli> for Settings {
    fn from(cli: &Cli) -> Self {
        let ttl_secs = i64::try_from(cli.ttl_secs).unwrap_or(i64::MAX / 1000);
        Self {
            store_dir: cli.store_dir.clone(),
            ttl: Duration::try_seconds(ttl_secs).unwrap_or_else(|| Duration::seconds(DEFAULT_TTL_SECS)),
            workers: cli.workers.max(1),
            fetch_timeout: StdDuration::from_secs(cli.timeout_secs),
            user_agent: cli
                .user_agent
                .clone()
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        }
    }
}
