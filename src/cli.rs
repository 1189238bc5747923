//! Command-line interface definitions for scrape_feed.
//!
//! This module defines the CLI arguments and subcommands using the `clap`
//! crate. Global options can be provided via flags or environment variables.

use clap::{Args, Parser, Subcommand};

/// Command-line arguments for scrape_feed.
///
/// # Examples
///
/// ```sh
/// # Register a page and print its id
/// scrape_feed add --name "Example" --url https://example.com/blog --selector "article"
///
/// # Print the cached feed, regenerating it if needed
/// scrape_feed feed 3kTq0vY8cBv9aX1LmN2p
///
/// # Refresh everything (e.g. from cron)
/// scrape_feed --store-dir /var/lib/scrape_feed refresh-all
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory holding the feed_sources and feed_contents documents
    #[arg(long, env = "SCRAPE_FEED_STORE_DIR", default_value = "./feed_store", global = true)]
    pub store_dir: String,

    /// Seconds a rendered feed is served before it is regenerated
    #[arg(long, env = "SCRAPE_FEED_TTL_SECS", default_value_t = 3600, global = true)]
    pub ttl_secs: u64,

    /// Maximum number of concurrent background refreshes
    #[arg(long, env = "SCRAPE_FEED_WORKERS", default_value_t = 4, global = true)]
    pub workers: usize,

    /// Timeout for fetching a source page, in seconds
    #[arg(long, env = "SCRAPE_FEED_TIMEOUT_SECS", default_value_t = 30, global = true)]
    pub timeout_secs: u64,

    /// User-Agent header sent with page fetches
    #[arg(long, env = "SCRAPE_FEED_USER_AGENT", global = true)]
    pub user_agent: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Display name, used as the channel title
    #[arg(long)]
    pub name: String,

    /// Page listing the articles
    #[arg(long)]
    pub url: String,

    /// CSS selector matching one element per article
    #[arg(long)]
    pub selector: String,

    /// Channel description
    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scrape a page and print the feed without storing anything
    Preview(PreviewArgs),
    #[command(flatten)]
    Store(StoreCommand),
}

#[derive(Args, Debug, Clone)]
pub struct PreviewArgs {
    #[arg(long)]
    pub url: String,
    #[arg(long)]
    pub selector: String,
    #[arg(long, default_value = "Preview")]
    pub name: String,
}

/// Commands that work against the feed store.
#[derive(Subcommand, Debug)]
pub enum StoreCommand {
    /// Register a new feed source
    Add(SourceArgs),
    /// List all feed sources
    List,
    /// Show one feed source
    Show { id: String },
    /// Delete a feed source and its cached feed
    Remove { id: String },
    /// Print the RSS feed for a source
    Feed {
        id: String,
        /// Write the feed to this file instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Regenerate one feed now
    Refresh { id: String },
    /// Regenerate every feed
    RefreshAll,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["scrape_feed", "list"]);

        assert_eq!(cli.store_dir, "./feed_store");
        assert_eq!(cli.ttl_secs, 3600);
        assert_eq!(cli.workers, 4);
        assert!(matches!(cli.command, Command::Store(StoreCommand::List)));
    }

    #[test]
    fn test_cli_add() {
        let cli = Cli::parse_from([
            "scrape_feed",
            "--store-dir",
            "/tmp/store",
            "add",
            "--name",
            "Example",
            "--url",
            "https://example.com",
            "--selector",
            "article.post",
        ]);

        assert_eq!(cli.store_dir, "/tmp/store");
        match cli.command {
            Command::Store(StoreCommand::Add(args)) => {
                assert_eq!(args.name, "Example");
                assert_eq!(args.selector, "article.post");
                assert!(args.description.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_cli_preview() {
        let cli = Cli::parse_from([
            "scrape_feed",
            "preview",
            "--url",
            "https://example.com/news",
            "--selector",
            "li.story",
        ]);

        match cli.command {
            Command::Preview(args) => {
                assert_eq!(args.url, "https://example.com/news");
                assert_eq!(args.selector, "li.story");
                assert_eq!(args.name, "Preview");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_cli_refresh_all() {
        let cli = Cli::parse_from(["scrape_feed", "refresh-all"]);
        assert!(matches!(cli.command, Command::Store(StoreCommand::RefreshAll)));
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["scrape_feed", "feed", "abc", "-o", "out.xml", "--ttl-secs", "60"]);

        assert_eq!(cli.ttl_secs, 60);
        match cli.command {
            Command::Store(StoreCommand::Feed { id, output }) => {
                assert_eq!(id, "abc");
                assert_eq!(output.as_deref(), Some("out.xml"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
