use chrono::{Duration, TimeZone, Utc};
use scrape_feed::cache::RefreshOutcome;
use scrape_feed::clock::FixedClock;
use scrape_feed::fetch::StaticFetcher;
use scrape_feed::store::{DocumentStore, JsonFileStore, MemoryStore};
use scrape_feed::tasks::BackgroundTasks;
use scrape_feed::{FeedError, FeedService, NewFeedSource};
use std::sync::Arc;

const URL: &str = "https://www.example.org/press/releases";

const PAGE: &str = r#"<!doctype html>
<html>
  <body>
    <nav><a href="/">Home</a></nav>
    <section class="releases">
      <div class="release">
        <h2>Quarterly results are in</h2>
        <a href="/press/q3-results">Read the release</a>
        <p>Short teaser.</p>
        <p>Revenue grew across every region, led by strong subscription sales.</p>
        <span class="meta">Posted on January 5, 2023 at noon</span>
      </div>
      <div class="release">
        <a href="https://cdn.example.org/files/annual-report.pdf"><img src="cover.png" alt=""></a>
      </div>
    </section>
  </body>
</html>"#;

fn new_source() -> NewFeedSource {
    NewFeedSource {
        name: "Example Press".to_string(),
        url: URL.to_string(),
        selector: "div.release".to_string(),
        description: None,
    }
}

#[tokio::test]
async fn test_two_blocks_render_two_entries() {
    let render_time = Utc.with_ymd_and_hms(2025, 5, 6, 20, 30, 0).unwrap();
    let store = Arc::new(MemoryStore::new());
    let fetcher = Arc::new(StaticFetcher::new());
    fetcher.insert(URL, PAGE);
    let clock = Arc::new(FixedClock::new(render_time));
    let service = FeedService::new(
        Arc::clone(&store),
        Arc::clone(&fetcher),
        Arc::clone(&clock),
        Duration::hours(1),
        BackgroundTasks::new(1),
        1,
    );

    let source = service.add_source(new_source()).await.unwrap();
    // the read races the initial background generation; either path renders the same document
    let xml = service.get_feed(&source.id).await.unwrap();
    service.tasks().drain().await;

    assert_eq!(xml.matches("<item>").count(), 2);
    assert!(xml.contains("<title>Example Press</title>"));
    assert!(xml.contains("<description>RSS feed for Example Press</description>"));
    assert!(xml.contains("<language>en</language>"));

    let first = &xml[xml.find("<item>").unwrap()..xml.find("</item>").unwrap()];
    assert!(first.contains("<title>Quarterly results are in</title>"));
    assert!(first.contains("<link>https://www.example.org/press/q3-results</link>"));
    assert!(first.contains(
        "<description>Revenue grew across every region, led by strong subscription sales.</description>"
    ));
    assert!(first.contains("<pubDate>Thu, 5 Jan 2023 12:00:00 +0000</pubDate>"));

    let second_start = xml.rfind("<item>").unwrap();
    let second = &xml[second_start..];
    assert!(second.contains("<title>Article 2</title>"));
    assert!(second.contains("<link>https://cdn.example.org/files/annual-report.pdf</link>"));
    assert!(second.contains("<description>No Description</description>"));
    assert!(second.contains("<pubDate>Tue, 6 May 2025 20:30:00 +0000</pubDate>"));
}

#[tokio::test]
async fn test_stale_while_revalidate_cycle() {
    let t0 = Utc.with_ymd_and_hms(2025, 5, 6, 8, 0, 0).unwrap();
    let store = Arc::new(MemoryStore::new());
    let fetcher = Arc::new(StaticFetcher::new());
    fetcher.insert(URL, PAGE);
    let clock = Arc::new(FixedClock::new(t0));
    let service = FeedService::new(
        Arc::clone(&store),
        Arc::clone(&fetcher),
        Arc::clone(&clock),
        Duration::hours(1),
        BackgroundTasks::new(2),
        2,
    );

    let source = service.add_source(new_source()).await.unwrap();
    service.tasks().drain().await;
    let first = store.get_content(&source.id).await.unwrap().unwrap();
    assert_eq!(first.generated_at, t0);

    // 30 minutes later: served from cache, nothing fetched
    clock.advance(Duration::minutes(30));
    let hits = fetcher.hits(URL);
    let read = service.cache().read(&source.id).await.unwrap();
    assert!(!read.needs_background_refresh);
    assert_eq!(read.content, first.content);
    assert_eq!(fetcher.hits(URL), hits);

    // 90 minutes after generation: stale content now, fresh content after the refresh
    clock.advance(Duration::minutes(60));
    let read = service.cache().read(&source.id).await.unwrap();
    assert!(read.needs_background_refresh);
    assert_eq!(read.content, first.content);

    let served = service.get_feed(&source.id).await.unwrap();
    assert_eq!(served, first.content);
    service.tasks().drain().await;
    let second = store.get_content(&source.id).await.unwrap().unwrap();
    assert_eq!(second.generated_at, t0 + Duration::minutes(90));

    // the page goes away: refresh is a no-op and the last good feed stays
    fetcher.remove(URL);
    clock.advance(Duration::hours(2));
    let outcome = service.cache().refresh(&source).await.unwrap();
    assert_eq!(outcome, RefreshOutcome::Unchanged);
    let kept = store.get_content(&source.id).await.unwrap().unwrap();
    assert_eq!(kept, second);
    assert_eq!(
        service.get_source(&source.id).await.unwrap().last_refreshed,
        Some(t0 + Duration::minutes(90))
    );
}

#[tokio::test]
async fn test_first_read_of_unreachable_page_is_an_error() {
    let store = Arc::new(MemoryStore::new());
    let fetcher = Arc::new(StaticFetcher::new());
    let clock = Arc::new(FixedClock::new(Utc::now()));
    let service = FeedService::new(
        store,
        fetcher,
        clock,
        Duration::hours(1),
        BackgroundTasks::new(1),
        1,
    );

    let source = service.add_source(new_source()).await.unwrap();
    service.tasks().drain().await;

    let err = service.get_feed(&source.id).await.unwrap_err();
    assert!(matches!(err, FeedError::Transport(_)));
    assert_eq!(err.status_code(), 500);
}

#[tokio::test]
async fn test_file_store_persists_across_services() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().to_str().unwrap().to_string();
    let t0 = Utc.with_ymd_and_hms(2025, 5, 6, 8, 0, 0).unwrap();
    let fetcher = Arc::new(StaticFetcher::new());
    fetcher.insert(URL, PAGE);

    let id = {
        let store = Arc::new(JsonFileStore::open(&dir).await.unwrap());
        let service = FeedService::new(
            store,
            Arc::clone(&fetcher),
            Arc::new(FixedClock::new(t0)),
            Duration::hours(1),
            BackgroundTasks::new(1),
            1,
        );
        let source = service.add_source(new_source()).await.unwrap();
        service.tasks().drain().await;
        source.id
    };

    let store = Arc::new(JsonFileStore::open(&dir).await.unwrap());
    let reopened = FeedService::new(
        Arc::clone(&store),
        Arc::clone(&fetcher),
        Arc::new(FixedClock::new(t0 + Duration::minutes(10))),
        Duration::hours(1),
        BackgroundTasks::new(1),
        1,
    );
    let hits = fetcher.hits(URL);
    let xml = reopened.get_feed(&id).await.unwrap();
    assert_eq!(xml.matches("<item>").count(), 2);
    assert_eq!(fetcher.hits(URL), hits);
    assert_eq!(reopened.list_sources().await.unwrap().len(), 1);
    assert_eq!(
        store.get_source(&id).await.unwrap().unwrap().last_refreshed,
        Some(t0)
    );
}
