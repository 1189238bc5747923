//! Data models for feed sources, extracted articles and rendered feeds.
//!
//! This module defines the core data structures used throughout the crate:
//! - [`FeedSource`]: A configured page plus the selector that finds its articles
//! - [`NewFeedSource`]: The user-supplied part of a source, before it is stored
//! - [`ExtractedItem`]: One article inferred from a candidate element
//! - [`RenderedFeed`]: The serialized RSS document cached for a source
//!
//! Sources and rendered feeds are persisted as JSON documents; extracted items
//! only live for the duration of a refresh.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The fields a caller provides when registering a new page to scrape.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct NewFeedSource {
    /// Display name, used as the channel title.
    pub name: String,
    /// The page that lists the articles.
    pub url: String,
    /// CSS selector matching one element per article.
    pub selector: String,
    /// Optional channel description.
    #[serde(default)]
    pub description: Option<String>,
}

/// A stored feed source.
///
/// Owned by the document store. A refresh only ever reads it; the one field the
/// refresh cycle writes back is `last_refreshed`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct FeedSource {
    /// Opaque identifier assigned by the store.
    pub id: String,
    pub name: String,
    pub url: String,
    pub selector: String,
    #[serde(default)]
    pub description: Option<String>,
    /// When the source was registered.
    pub created_at: DateTime<Utc>,
    /// When a rendered feed was last written for this source.
    #[serde(default)]
    pub last_refreshed: Option<DateTime<Utc>>,
}

impl FeedSource {
    /// Build a stored source from user input.
    pub fn from_new(id: String, new: NewFeedSource, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: new.name,
            url: new.url,
            selector: new.selector,
            description: new.description,
            created_at,
            last_refreshed: None,
        }
    }
}

/// One article inferred from a candidate element.
///
/// `title` is never empty: either a heading was found or a positional
/// placeholder was synthesized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedItem {
    pub title: String,
    /// Absolute URL.
    pub link: String,
    /// Possibly empty.
    pub description: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// The cached RSS document for one source.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RenderedFeed {
    /// The serialized RSS 2.0 document.
    pub content: String,
    pub generated_at: DateTime<Utc>,
}
