//! RSS 2.0 rendering.
//!
//! Channel metadata comes from the [`FeedSource`]; one `<item>` is written per
//! [`ExtractedItem`], in order. Missing item fields fall back to fixed
//! strings, and missing dates to the render time, so every item carries a
//! title, description and `pubDate`.
//!
//! The render time is passed in rather than read from the system clock;
//! identical inputs and an identical `rendered_at` produce identical bytes.

use crate::clock::Clock;
use crate::models::{ExtractedItem, FeedSource};
use chrono::{DateTime, Utc};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io::{self, Write};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Media type of the rendered document.
pub const RSS_MEDIA_TYPE: &str = "application/rss+xml";
/// Channel language.
pub const FEED_LANGUAGE: &str = "en";
pub const DEFAULT_ITEM_TITLE: &str = "No Title";
pub const DEFAULT_ITEM_DESCRIPTION: &str = "No Description";
const GENERATOR: &str = concat!("scrape_feed ", env!("CARGO_PKG_VERSION"));

fn write_text_element<W: Write>(w: &mut Writer<W>, name: &str, text: &str) -> io::Result<()> {
    w.write_event(Event::Start(BytesStart::new(name)))?;
    w.write_event(Event::Text(BytesText::new(&sanitize_text(text))))?;
    w.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

// Remove control characters that are invalid in XML 1.0.
fn sanitize_text(input: &str) -> String {
    input
        .chars()
        .filter(|&c| matches!(c, '\t' | '\n' | '\r') || c >= ' ')
        .collect()
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.trim().is_empty() { default } else { value }
}

/// Render `items` as an RSS 2.0 document stamped with `rendered_at`.
#[instrument(level = "debug", skip_all, fields(source_id = %source.id, items = items.len()))]
pub fn render_at(
    source: &FeedSource,
    items: &[ExtractedItem],
    rendered_at: DateTime<Utc>,
) -> io::Result<Vec<u8>> {
    let now = rendered_at.to_rfc2822();
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut rss_start = BytesStart::new("rss");
    rss_start.push_attribute(("version", "2.0"));
    writer.write_event(Event::Start(rss_start))?;
    writer.write_event(Event::Start(BytesStart::new("channel")))?;

    let title = or_default(&source.name, "RSS Feed");
    let description = match source.description.as_deref() {
        Some(d) if !d.trim().is_empty() => d.to_string(),
        _ => format!("RSS feed for {title}"),
    };
    write_text_element(&mut writer, "title", title)?;
    write_text_element(&mut writer, "link", &source.url)?;
    write_text_element(&mut writer, "description", &description)?;
    write_text_element(&mut writer, "language", FEED_LANGUAGE)?;
    write_text_element(&mut writer, "pubDate", &now)?;
    write_text_element(&mut writer, "lastBuildDate", &now)?;
    write_text_element(&mut writer, "generator", GENERATOR)?;

    for item in items {
        writer.write_event(Event::Start(BytesStart::new("item")))?;
        write_text_element(&mut writer, "title", or_default(&item.title, DEFAULT_ITEM_TITLE))?;
        write_text_element(&mut writer, "link", &item.link)?;
        write_text_element(
            &mut writer,
            "description",
            or_default(&item.description, DEFAULT_ITEM_DESCRIPTION),
        )?;
        let published = item.published_at.map(|d| d.to_rfc2822());
        write_text_element(&mut writer, "pubDate", published.as_deref().unwrap_or(&now))?;
        writer.write_event(Event::End(BytesEnd::new("item")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("channel")))?;
    writer.write_event(Event::End(BytesEnd::new("rss")))?;

    let mut out = writer.into_inner();
    out.push(b'\n');
    debug!(bytes = out.len(), "Rendered RSS document");
    Ok(out)
}

/// Renders feeds stamped with the time read from a [`Clock`].
#[derive(Debug)]
pub struct FeedRenderer<C> {
    clock: Arc<C>,
}

impl<C> Clone for FeedRenderer<C> {
    fn clone(&self) -> Self {
        Self {
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<C: Clock> FeedRenderer<C> {
    pub fn new(clock: Arc<C>) -> Self {
        Self { clock }
    }

    /// Render at the clock's current time.
    pub fn render(&self, source: &FeedSource, items: &[ExtractedItem]) -> io::Result<Vec<u8>> {
        render_at(source, items, self.clock.now())
    }

    /// Render at the clock's current time, returning the time used.
    pub fn render_string(
        &self,
        source: &FeedSource,
        items: &[ExtractedItem],
    ) -> io::Result<(String, DateTime<Utc>)> {
        let now = self.clock.now();
        let bytes = render_at(source, items, now)?;
        let content =
            String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok((content, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::TimeZone;

    fn source(description: Option<&str>) -> FeedSource {
        FeedSource {
            id: "s1".to_string(),
            name: "Example & Co".to_string(),
            url: "https://example.com/news".to_string(),
            selector: "article".to_string(),
            description: description.map(str::to_string),
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            last_refreshed: None,
        }
    }

    fn render_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 6, 20, 30, 0).unwrap()
    }

    fn render(source: &FeedSource, items: &[ExtractedItem]) -> String {
        String::from_utf8(render_at(source, items, render_time()).unwrap()).unwrap()
    }

    #[test]
    fn test_channel_metadata() {
        let xml = render(&source(Some("Latest posts")), &[]);

        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(r#"<rss version="2.0">"#));
        assert!(xml.contains("<title>Example &amp; Co</title>"));
        assert!(xml.contains("<link>https://example.com/news</link>"));
        assert!(xml.contains("<description>Latest posts</description>"));
        assert!(xml.contains("<language>en</language>"));
        assert!(xml.contains("<pubDate>Tue, 6 May 2025 20:30:00 +0000</pubDate>"));
        assert!(!xml.contains("<item>"));
    }

    #[test]
    fn test_channel_description_default() {
        let xml = render(&source(None), &[]);
        assert!(xml.contains("<description>RSS feed for Example &amp; Co</description>"));
    }

    #[test]
    fn test_item_fields_and_fallbacks() {
        let items = vec![
            ExtractedItem {
                title: "Full <item>".to_string(),
                link: "https://example.com/a".to_string(),
                description: "Body".to_string(),
                published_at: Some(Utc.with_ymd_and_hms(2023, 1, 5, 12, 0, 0).unwrap()),
            },
            ExtractedItem {
                title: String::new(),
                link: "https://example.com/b".to_string(),
                description: String::new(),
                published_at: None,
            },
        ];
        let xml = render(&source(None), &items);

        assert_eq!(xml.matches("<item>").count(), 2);
        let first = xml.find("Full &lt;item&gt;").unwrap();
        let second = xml.find("<title>No Title</title>").unwrap();
        assert!(first < second);
        assert!(xml.contains("<link>https://example.com/a</link>"));
        assert!(xml.contains("<pubDate>Thu, 5 Jan 2023 12:00:00 +0000</pubDate>"));
        assert!(xml.contains("<description>No Description</description>"));
        // channel pubDate, lastBuildDate and the undated item share the render time
        assert_eq!(xml.matches("Tue, 6 May 2025 20:30:00 +0000").count(), 3);
    }

    #[test]
    fn test_control_characters_are_stripped() {
        let items = vec![ExtractedItem {
            title: "Bell\u{7} title".to_string(),
            link: "https://example.com/bell".to_string(),
            description: "tab\tkept".to_string(),
            published_at: None,
        }];
        let xml = render(&source(None), &items);
        assert!(xml.contains("<title>Bell title</title>"));
        assert!(xml.contains("<description>tab\tkept</description>"));
    }

    #[test]
    fn test_deterministic_with_fixed_clock() {
        let clock = Arc::new(FixedClock::new(render_time()));
        let renderer = FeedRenderer::new(clock);
        let items = vec![ExtractedItem {
            title: "T".to_string(),
            link: "https://example.com/t".to_string(),
            description: "D".to_string(),
            published_at: None,
        }];

        let a = renderer.render(&source(None), &items).unwrap();
        let b = renderer.render(&source(None), &items).unwrap();
        assert_eq!(a, b);

        let (content, at) = renderer.render_string(&source(None), &items).unwrap();
        assert_eq!(content.as_bytes(), a.as_slice());
        assert_eq!(at, render_time());
    }
}
