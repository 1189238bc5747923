//! Article extraction: from a source page to an ordered list of items.
//!
//! The pipeline runs in two phases:
//!
//! 1. **Fetching**: download the source page through a [`PageFetcher`]
//! 2. **Extraction**: apply the source's selector and infer each article's
//!    fields (see [`fields`])
//!
//! # Submodules
//!
//! | Module | Role |
//! |--------|------|
//! | [`link`] | Make hrefs absolute against the page origin |
//! | [`date`] | Find the first date expression in a block of text |
//! | [`fields`] | Title, link, description and date heuristics |
//!
//! Extraction is synchronous and never holds the parsed document across an
//! await point.

pub mod date;
pub mod fields;
pub mod link;

use crate::error::ExtractionError;
use crate::fetch::PageFetcher;
use crate::models::{ExtractedItem, FeedSource};
use scraper::{Html, Selector};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Parse `html` and extract one item per element matching `selector`.
///
/// Document order is preserved; candidates without an `href` are skipped.
pub fn extract_items(
    html: &str,
    selector: &str,
    page_url: &str,
) -> Result<Vec<ExtractedItem>, ExtractionError> {
    let selector = Selector::parse(selector)
        .map_err(|_| ExtractionError::InvalidSelector(selector.to_string()))?;
    let document = Html::parse_document(html);

    let mut candidates = 0usize;
    let items: Vec<ExtractedItem> = document
        .select(&selector)
        .enumerate()
        .filter_map(|(position, element)| {
            candidates += 1;
            fields::extract(&element, position, page_url)
        })
        .collect();

    debug!(
        candidates,
        kept = items.len(),
        dropped = candidates - items.len(),
        "Extracted items"
    );
    Ok(items)
}

/// Fetches a source page and turns it into items.
#[derive(Debug)]
pub struct ArticleExtractionPipeline<F> {
    fetcher: Arc<F>,
}

impl<F> Clone for ArticleExtractionPipeline<F> {
    fn clone(&self) -> Self {
        Self {
            fetcher: Arc::clone(&self.fetcher),
        }
    }
}

impl<F: PageFetcher> ArticleExtractionPipeline<F> {
    pub fn new(fetcher: Arc<F>) -> Self {
        Self { fetcher }
    }

    /// Run the pipeline, reporting why nothing could be extracted.
    #[instrument(level = "info", skip_all, fields(source_id = %source.id, url = %source.url))]
    pub async fn try_run(&self, source: &FeedSource) -> Result<Vec<ExtractedItem>, ExtractionError> {
        let html = self.fetcher.fetch(&source.url).await?;
        let items = extract_items(&html, &source.selector, &source.url)?;
        info!(count = items.len(), "Scraped source page");
        Ok(items)
    }

    /// Run the pipeline, degrading every failure to an empty list.
    ///
    /// A failed fetch and a selector that matched nothing look the same here;
    /// use [`Self::try_run`] to tell them apart.
    pub async fn run(&self, source: &FeedSource) -> Vec<ExtractedItem> {
        match self.try_run(source).await {
            Ok(items) => items,
            Err(e) => {
                warn!(source_id = %source.id, name = %source.name, error = %e, "Error scraping source");
                Vec::new()
            }
        }
    }
}
