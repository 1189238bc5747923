//! Document store for feed sources and their rendered feeds.
//!
//! Two logical collections, both keyed by source id:
//!
//! | Collection | Document |
//! |------------|----------|
//! | `feed_sources` | [`FeedSource`] |
//! | `feed_contents` | [`RenderedFeed`] |
//!
//! Each document is read and written atomically; nothing above the store
//! takes locks. Backends:
//!
//! - [`MemoryStore`]: process-local, for tests and previews
//! - [`JsonFileStore`]: one JSON file per document under a directory

mod json;
mod memory;

pub use json::JsonFileStore;
pub use memory::MemoryStore;

use crate::error::StoreError;
use crate::models::{FeedSource, RenderedFeed};
use chrono::{DateTime, Utc};
use std::future::Future;

pub const SOURCES_COLLECTION: &str = "feed_sources";
pub const CONTENTS_COLLECTION: &str = "feed_contents";

pub trait DocumentStore: Send + Sync + 'static {
    fn get_source(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<FeedSource>, StoreError>> + Send;

    /// All sources, in no particular order.
    fn list_sources(&self) -> impl Future<Output = Result<Vec<FeedSource>, StoreError>> + Send;

    /// Insert or replace.
    fn put_source(&self, source: &FeedSource)
    -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Returns `false` if there was nothing to delete.
    fn delete_source(&self, id: &str) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Update `last_refreshed` of an existing source.
    ///
    /// Returns `false` if the source no longer exists.
    fn set_last_refreshed(
        &self,
        id: &str,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    fn get_content(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<RenderedFeed>, StoreError>> + Send;

    /// Insert or replace.
    fn put_content(
        &self,
        id: &str,
        feed: &RenderedFeed,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Returns `false` if there was nothing to delete.
    fn delete_content(&self, id: &str) -> impl Future<Output = Result<bool, StoreError>> + Send;
}
