//! # scrape_feed
//!
//! Command-line front end for the feed cache: register pages, print their
//! RSS feeds and trigger refreshes.
//!
//! ## Usage
//!
//! ```sh
//! scrape_feed add --name Example --url https://example.com/blog --selector article
//! scrape_feed feed <id> -o example.xml
//! scrape_feed refresh-all
//! ```
//!
//! Background regenerations queued by a command are awaited before the
//! process exits.

use chrono::Utc;
use clap::Parser;
use scrape_feed::cli::{Cli, Command, PreviewArgs, StoreCommand};
use scrape_feed::clock::{Clock, SystemClock};
use scrape_feed::config::Settings;
use scrape_feed::fetch::{PageFetcher, ReqwestFetcher};
use scrape_feed::outputs::rss;
use scrape_feed::store::{DocumentStore, JsonFileStore};
use scrape_feed::tasks::BackgroundTasks;
use scrape_feed::utils::truncate_for_log;
use scrape_feed::{ArticleExtractionPipeline, FeedError, FeedService, FeedSource, NewFeedSource};
use std::error::Error;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

async fn write_stdout(bytes: &[u8]) -> Result<(), Box<dyn Error>> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(bytes).await?;
    stdout.flush().await?;
    Ok(())
}

async fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    write_stdout(json.as_bytes()).await
}

fn report(e: FeedError) -> Box<dyn Error> {
    error!(status = e.status_code(), error = %e, "Command failed");
    Box::new(e)
}

#[instrument(level = "info", skip_all, fields(url = %args.url, selector = %args.selector))]
async fn preview(fetcher: Arc<ReqwestFetcher>, args: PreviewArgs) -> Result<(), Box<dyn Error>> {
    let PreviewArgs {
        url,
        selector,
        name,
    } = args;
    let now = Utc::now();
    let source = FeedSource {
        id: "preview".to_string(),
        name,
        url,
        selector,
        description: None,
        created_at: now,
        last_refreshed: None,
    };
    let pipeline = ArticleExtractionPipeline::new(fetcher);
    let items = pipeline.try_run(&source).await.map_err(|e| report(e.into()))?;
    for item in &items {
        debug!(
            title = %item.title,
            link = %item.link,
            description = %truncate_for_log(&item.description, 120),
            published_at = ?item.published_at,
            "Preview item"
        );
    }
    let xml = rss::render_at(&source, &items, now)?;
    write_stdout(&xml).await
}

async fn run<S, F, C>(service: &FeedService<S, F, C>, command: StoreCommand) -> Result<(), Box<dyn Error>>
where
    S: DocumentStore,
    F: PageFetcher,
    C: Clock,
{
    match command {
        StoreCommand::Add(source) => {
            let new = NewFeedSource {
                name: source.name,
                url: source.url,
                selector: source.selector,
                description: source.description,
            };
            let created = service.add_source(new).await.map_err(report)?;
            print_json(&created).await
        }
        StoreCommand::List => {
            let sources = service.list_sources().await.map_err(report)?;
            print_json(&sources).await
        }
        StoreCommand::Show { id } => {
            let source = service.get_source(&id).await.map_err(report)?;
            print_json(&source).await
        }
        StoreCommand::Remove { id } => {
            service.delete_source(&id).await.map_err(report)?;
            info!(%id, "Feed source deleted");
            Ok(())
        }
        StoreCommand::Feed { id, output } => {
            let content = service.get_feed(&id).await.map_err(report)?;
            match output {
                Some(path) => {
                    tokio::fs::write(&path, &content).await?;
                    info!(%path, media_type = rss::RSS_MEDIA_TYPE, "Wrote feed");
                    Ok(())
                }
                None => write_stdout(content.as_bytes()).await,
            }
        }
        StoreCommand::Refresh { id } => {
            let message = service.refresh_source(&id).await.map_err(report)?;
            info!("{message}");
            Ok(())
        }
        StoreCommand::RefreshAll => {
            let count = service.refresh_all().await.map_err(report)?;
            info!("Refreshing {count} feeds");
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    let args = Cli::parse();
    let settings = Settings::from(&args);
    debug!(?settings, "Loaded settings");

    let fetcher = Arc::new(ReqwestFetcher::new(
        settings.fetch_timeout,
        &settings.user_agent,
    )?);

    // Previews never touch the store.
    let command = match args.command {
        Command::Preview(preview_args) => return preview(fetcher, preview_args).await,
        Command::Store(command) => command,
    };

    let store = Arc::new(JsonFileStore::open(&settings.store_dir).await?);
    let tasks = BackgroundTasks::new(settings.workers);
    let service = FeedService::new(
        store,
        fetcher,
        Arc::new(SystemClock),
        settings.ttl,
        tasks.clone(),
        settings.workers,
    );

    let result = run(&service, command).await;

    // Let queued regenerations finish before the process goes away.
    tasks.drain().await;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    result
}
