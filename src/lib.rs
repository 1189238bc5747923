//! # scrape_feed
//!
//! Turns pages that list articles into RSS feeds, and keeps those feeds
//! fresh with a time-based cache.
//!
//! ## Architecture
//!
//! A refresh follows a pipeline:
//! 1. **Fetching**: Download the source page ([`fetch`])
//! 2. **Extraction**: Select candidate elements and infer title, link,
//!    description and date for each ([`extract`])
//! 3. **Rendering**: Serialize the items as RSS 2.0 ([`outputs::rss`])
//! 4. **Caching**: Write the document through to the store ([`cache`], [`store`])
//!
//! Reads go through [`cache::CacheOrchestrator`], which serves fresh content
//! as is, generates missing content on the spot, and serves stale content
//! while a regeneration is queued on [`tasks::BackgroundTasks`].

pub mod cache;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod models;
pub mod outputs;
pub mod service;
pub mod store;
pub mod tasks;
pub mod utils;

pub use cache::{CacheOrchestrator, CacheRead, RefreshOutcome};
pub use error::{ExtractionError, FeedError, StoreError, TransportError};
pub use extract::ArticleExtractionPipeline;
pub use models::{ExtractedItem, FeedSource, NewFeedSource, RenderedFeed};
pub use outputs::rss::{FeedRenderer, RSS_MEDIA_TYPE};
pub use service::FeedService;
