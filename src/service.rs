//! Operations exposed to the front end: source registry, feed reads and
//! refresh triggers.
//!
//! Every dependency is passed in at construction; nothing here is global.
//! Regeneration requested by a stale read, an explicit refresh or a
//! refresh-all is handed to the [`BackgroundTasks`] pool and not awaited.

use crate::cache::{CacheOrchestrator, RefreshOutcome};
use crate::clock::Clock;
use crate::error::FeedError;
use crate::fetch::PageFetcher;
use crate::models::{FeedSource, NewFeedSource};
use crate::store::DocumentStore;
use crate::tasks::BackgroundTasks;
use crate::utils::generate_id;
use chrono::Duration;
use std::sync::Arc;
use tracing::{error, info, instrument};

pub struct FeedService<S, F, C> {
    store: Arc<S>,
    cache: CacheOrchestrator<S, F, C>,
    clock: Arc<C>,
    tasks: BackgroundTasks,
    sweep_parallelism: usize,
}

impl<S, F, C> FeedService<S, F, C>
where
    S: DocumentStore,
    F: PageFetcher,
    C: Clock,
{
    pub fn new(
        store: Arc<S>,
        fetcher: Arc<F>,
        clock: Arc<C>,
        ttl: Duration,
        tasks: BackgroundTasks,
        sweep_parallelism: usize,
    ) -> Self {
        let cache = CacheOrchestrator::new(Arc::clone(&store), fetcher, Arc::clone(&clock), ttl);
        Self {
            store,
            cache,
            clock,
            tasks,
            sweep_parallelism,
        }
    }

    pub fn cache(&self) -> &CacheOrchestrator<S, F, C> {
        &self.cache
    }

    pub fn tasks(&self) -> &BackgroundTasks {
        &self.tasks
    }

    /// Queue a refresh of `source` on the background pool.
    fn schedule_refresh(&self, source: FeedSource) {
        let cache = self.cache.clone();
        let label = format!("refresh:{}", source.id);
        self.tasks.submit(&label, async move {
            match cache.refresh(&source).await {
                Ok(RefreshOutcome::Refreshed { items, .. }) => {
                    info!(source_id = %source.id, items, "Background refresh complete")
                }
                Ok(RefreshOutcome::Unchanged) => {}
                Err(e) => error!(source_id = %source.id, error = %e, "Background refresh failed"),
            }
        });
    }

    /// Register a source and queue its first generation.
    #[instrument(level = "info", skip_all, fields(name = %new.name, url = %new.url))]
    pub async fn add_source(&self, new: NewFeedSource) -> Result<FeedSource, FeedError> {
        let source = FeedSource::from_new(generate_id(), new, self.clock.now());
        self.store.put_source(&source).await?;
        info!(source_id = %source.id, "Added feed source");
        self.schedule_refresh(source.clone());
        Ok(source)
    }

    pub async fn list_sources(&self) -> Result<Vec<FeedSource>, FeedError> {
        let mut sources = self.store.list_sources().await?;
        sources.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(sources)
    }

    pub async fn get_source(&self, id: &str) -> Result<FeedSource, FeedError> {
        self.store
            .get_source(id)
            .await?
            .ok_or_else(|| FeedError::NotFound(id.to_string()))
    }

    /// Delete a source and its cached feed.
    #[instrument(level = "info", skip(self))]
    pub async fn delete_source(&self, id: &str) -> Result<(), FeedError> {
        if !self.store.delete_source(id).await? {
            return Err(FeedError::NotFound(id.to_string()));
        }
        let had_content = self.store.delete_content(id).await?;
        info!(had_content, "Deleted feed source");
        Ok(())
    }

    /// The RSS document for `id`.
    ///
    /// Stale content is returned as is, with a refresh queued behind it.
    #[instrument(level = "info", skip(self))]
    pub async fn get_feed(&self, id: &str) -> Result<String, FeedError> {
        let read = self.cache.read(id).await?;
        if read.needs_background_refresh {
            self.schedule_refresh(read.source);
        }
        Ok(read.content)
    }

    /// Queue a refresh of one source, whatever the age of its feed.
    #[instrument(level = "info", skip(self))]
    pub async fn refresh_source(&self, id: &str) -> Result<String, FeedError> {
        let source = self.get_source(id).await?;
        let message = format!("Feed refresh started for {}", source.name);
        self.schedule_refresh(source);
        Ok(message)
    }

    /// Queue a sweep refreshing every source; returns how many were queued.
    #[instrument(level = "info", skip_all)]
    pub async fn refresh_all(&self) -> Result<usize, FeedError> {
        let sources = self.store.list_sources().await?;
        let count = sources.len();
        let cache = self.cache.clone();
        let parallel = self.sweep_parallelism;
        self.tasks.submit("refresh-all", async move {
            let results = cache.refresh_many(sources, parallel).await;
            let refreshed = results
                .iter()
                .filter(|(_, r)| matches!(r, Ok(RefreshOutcome::Refreshed { .. })))
                .count();
            info!(total = results.len(), refreshed, "Refresh sweep complete");
        });
        info!(count, "Refreshing feeds");
        Ok(count)
    }
}
