//! Per-article field inference.
//!
//! Each heuristic is a small function over a [`Queryable`] element, so it can
//! be exercised on its own:
//!
//! - [`find_title`]: first heading by level, then a `.title` element
//! - [`find_href`]: first anchor's `href`, or the element's own
//! - [`pick_description`]: longest paragraph/summary, else the block text
//!   minus the title
//! - [`pick_date`]: first date found in the block text
//!
//! [`extract`] combines them and decides whether the candidate survives:
//! a candidate whose link source has no `href` is dropped.

use super::{date, link};
use crate::models::ExtractedItem;
use crate::utils::flatten_text;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};
use std::cmp::Reverse;
use tracing::debug;

/// The element operations the heuristics need.
pub trait Queryable: Sized {
    /// First matching descendant in document order.
    fn select_first(&self, selector: &Selector) -> Option<Self>;
    /// All matching descendants in document order.
    fn select_all(&self, selector: &Selector) -> Vec<Self>;
    /// Text content, fragments trimmed and joined by single spaces.
    fn flat_text(&self) -> String;
    fn attr(&self, name: &str) -> Option<&str>;
}

impl<'a> Queryable for ElementRef<'a> {
    fn select_first(&self, selector: &Selector) -> Option<Self> {
        self.select(selector).next()
    }

    fn select_all(&self, selector: &Selector) -> Vec<Self> {
        self.select(selector).collect()
    }

    fn flat_text(&self) -> String {
        flatten_text(self.text())
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.value().attr(name)
    }
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("built-in selector `{css}` is invalid: {e}"))
}

/// Title candidates, highest priority first.
static TITLE_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    ["h1", "h2", "h3", "h4", "h5", ".title"]
        .into_iter()
        .map(selector)
        .collect()
});
static ANCHOR: Lazy<Selector> = Lazy::new(|| selector("a"));
static DESCRIPTION: Lazy<Selector> = Lazy::new(|| selector("p, .summary, .description"));

/// The text of the highest-priority non-empty heading inside `element`.
pub fn find_title<E: Queryable>(element: &E) -> Option<String> {
    TITLE_SELECTORS.iter().find_map(|sel| {
        element
            .select_all(sel)
            .iter()
            .map(Queryable::flat_text)
            .find(|text| !text.is_empty())
    })
}

/// The raw `href` of the link source.
///
/// The link source is the first anchor inside `element`, or `element` itself
/// when it contains none (the candidate may be the anchor).
pub fn find_href<E: Queryable>(element: &E) -> Option<String> {
    match element.select_first(&ANCHOR) {
        Some(anchor) => anchor.attr("href").map(str::to_string),
        None => element.attr("href").map(str::to_string),
    }
}

/// The longest paragraph-like text, first one winning ties.
///
/// Without any paragraph-like children, falls back to the whole block text
/// with every occurrence of `title` cut out.
pub fn pick_description<E: Queryable>(element: &E, title: &str) -> String {
    let longest = element
        .select_all(&DESCRIPTION)
        .iter()
        .map(Queryable::flat_text)
        .enumerate()
        .max_by_key(|(i, text)| (text.chars().count(), Reverse(*i)))
        .map(|(_, text)| text);

    match longest {
        Some(text) => text,
        None => {
            let text = element.flat_text();
            if title.is_empty() {
                text
            } else {
                text.replace(title, "").trim().to_string()
            }
        }
    }
}

/// The first date mentioned anywhere in the block.
pub fn pick_date<E: Queryable>(element: &E) -> Option<DateTime<Utc>> {
    date::infer(&element.flat_text())
}

/// Infer one article from a candidate element.
///
/// `position` is the candidate's zero-based index among the selector's
/// matches; it numbers the `Article N` placeholder title used when no
/// heading is found. Returns `None` when the link source has no `href`.
pub fn extract<E: Queryable>(element: &E, position: usize, page_url: &str) -> Option<ExtractedItem> {
    let Some(href) = find_href(element) else {
        debug!(position, "Dropping candidate without an href");
        return None;
    };
    let link = link::normalize(&href, page_url);
    let title = find_title(element).unwrap_or_else(|| format!("Article {}", position + 1));

    let description = pick_description(element, &title);
    let published_at = pick_date(element);
    if published_at.is_none() {
        debug!(position, %title, "No date found");
    }

    Some(ExtractedItem {
        title,
        link,
        description,
        published_at,
    })
}
