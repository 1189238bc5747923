//! Staleness policy and regeneration of rendered feeds.
//!
//! Per source, the cached document is in one of three states:
//!
//! | State | Condition | On read |
//! |-------|-----------|---------|
//! | Empty | no `feed_contents` document | generate now, store, return it |
//! | Fresh | `age <= ttl` | return it |
//! | Stale | `age > ttl` | return it, flag a background refresh |
//!
//! [`CacheOrchestrator::refresh`] regenerates unconditionally but never
//! replaces cached content with an empty feed.

use crate::clock::Clock;
use crate::error::FeedError;
use crate::extract::ArticleExtractionPipeline;
use crate::fetch::PageFetcher;
use crate::models::{ExtractedItem, FeedSource, RenderedFeed};
use crate::outputs::rss::FeedRenderer;
use crate::store::DocumentStore;
use chrono::{DateTime, Duration, Utc};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// How long a rendered feed is served without regeneration, in seconds.
pub const DEFAULT_TTL_SECS: i64 = 3600;

pub fn default_ttl() -> Duration {
    Duration::seconds(DEFAULT_TTL_SECS)
}

/// Result of a cache read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRead {
    pub content: String,
    pub generated_at: DateTime<Utc>,
    /// The content is stale; the caller should schedule a refresh.
    pub needs_background_refresh: bool,
    /// The source as loaded for this read.
    pub source: FeedSource,
}

/// What [`CacheOrchestrator::refresh`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Refreshed {
        items: usize,
        generated_at: DateTime<Utc>,
    },
    /// Nothing was extracted; the cache was left alone.
    Unchanged,
}

pub struct CacheOrchestrator<S, F, C> {
    store: Arc<S>,
    pipeline: ArticleExtractionPipeline<F>,
    renderer: FeedRenderer<C>,
    clock: Arc<C>,
    ttl: Duration,
}

impl<S, F, C> Clone for CacheOrchestrator<S, F, C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            pipeline: self.pipeline.clone(),
            renderer: self.renderer.clone(),
            clock: Arc::clone(&self.clock),
            ttl: self.ttl,
        }
    }
}

impl<S, F, C> CacheOrchestrator<S, F, C>
where
    S: DocumentStore,
    F: PageFetcher,
    C: Clock,
{
    pub fn new(store: Arc<S>, fetcher: Arc<F>, clock: Arc<C>, ttl: Duration) -> Self {
        Self {
            store,
            pipeline: ArticleExtractionPipeline::new(fetcher),
            renderer: FeedRenderer::new(Arc::clone(&clock)),
            clock,
            ttl,
        }
    }

    pub fn pipeline(&self) -> &ArticleExtractionPipeline<F> {
        &self.pipeline
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// `true` once `generated_at` is more than one TTL in the past.
    ///
    /// A timestamp in the future counts as fresh.
    pub fn is_stale(&self, generated_at: DateTime<Utc>) -> bool {
        self.clock.now() - generated_at > self.ttl
    }

    /// Read the cached feed for `source_id`, generating it if absent.
    #[instrument(level = "info", skip(self))]
    pub async fn read(&self, source_id: &str) -> Result<CacheRead, FeedError> {
        let source = self
            .store
            .get_source(source_id)
            .await?
            .ok_or_else(|| FeedError::NotFound(source_id.to_string()))?;

        match self.store.get_content(source_id).await? {
            Some(feed) => {
                let stale = self.is_stale(feed.generated_at);
                if stale {
                    info!(generated_at = %feed.generated_at, "Serving stale feed");
                }
                Ok(CacheRead {
                    content: feed.content,
                    generated_at: feed.generated_at,
                    needs_background_refresh: stale,
                    source,
                })
            }
            None => {
                info!("No cached feed; generating now");
                let feed = self.generate(&source).await?;
                Ok(CacheRead {
                    content: feed.content,
                    generated_at: feed.generated_at,
                    needs_background_refresh: false,
                    source,
                })
            }
        }
    }

    /// Generate synchronously, failing if nothing usable was extracted.
    async fn generate(&self, source: &FeedSource) -> Result<RenderedFeed, FeedError> {
        let items = self.pipeline.try_run(source).await?;
        if items.is_empty() {
            return Err(FeedError::EmptyResult(source.id.clone()));
        }
        self.materialize(source, &items).await
    }

    /// Render `items`, write the feed and stamp the source.
    async fn materialize(
        &self,
        source: &FeedSource,
        items: &[ExtractedItem],
    ) -> Result<RenderedFeed, FeedError> {
        let (content, generated_at) = self.renderer.render_string(source, items)?;
        let feed = RenderedFeed {
            content,
            generated_at,
        };
        self.store.put_content(&source.id, &feed).await?;
        if !self.store.set_last_refreshed(&source.id, generated_at).await? {
            warn!(source_id = %source.id, "Source disappeared during refresh");
        }
        Ok(feed)
    }

    /// Regenerate the feed for `source` regardless of its age.
    #[instrument(level = "info", skip_all, fields(source_id = %source.id))]
    pub async fn refresh(&self, source: &FeedSource) -> Result<RefreshOutcome, FeedError> {
        let items = self.pipeline.run(source).await;
        if items.is_empty() {
            info!(name = %source.name, "No items found; keeping cached content");
            return Ok(RefreshOutcome::Unchanged);
        }
        let feed = self.materialize(source, &items).await?;
        info!(name = %source.name, count = items.len(), "Feed refreshed");
        Ok(RefreshOutcome::Refreshed {
            items: items.len(),
            generated_at: feed.generated_at,
        })
    }

    /// Refresh many sources, at most `parallel` at a time.
    ///
    /// One source failing does not stop the others; each result is reported
    /// next to its source id, in completion order.
    pub async fn refresh_many(
        &self,
        sources: Vec<FeedSource>,
        parallel: usize,
    ) -> Vec<(String, Result<RefreshOutcome, FeedError>)> {
        stream::iter(sources)
            .map(|source| async move {
                let outcome = self.refresh(&source).await;
                if let Err(e) = &outcome {
                    warn!(source_id = %source.id, error = %e, "Refresh failed");
                }
                (source.id, outcome)
            })
            .buffer_unordered(parallel.max(1))
            .collect()
            .await
    }
}
