use crate::config::FetchConfig;
use crate::types::{DigestError, FeedSource, NewsItem, Result};
use chrono::{DateTime, Duration, Utc};
use feed_rs::model::{Entry, Feed};
use feed_rs::parser;
use reqwest::Client;
use tracing::{debug, info, warn};

/// Summaries are truncated to this many characters before classification.
pub const SUMMARY_MAX_CHARS: usize = 300;

/// Retrieves and parses the configured feed endpoints and normalizes their
/// entries into `NewsItem` records within the recency window.
///
/// One unreachable or malformed feed contributes zero items; it never aborts
/// the run. Malformed entries within a healthy feed are skipped individually.
pub struct FeedFetcher {
    client: Client,
}

impl FeedFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self { client })
    }

    /// Fetch every source sequentially and return the flat item list for
    /// entries published within `[now - hours_back, now]`. No ordering
    /// guarantee across sources at this stage.
    pub async fn fetch_recent(&self, sources: &[FeedSource], hours_back: u32) -> Vec<NewsItem> {
        let now = Utc::now();
        let cutoff = now - Duration::hours(i64::from(hours_back));
        info!(
            hours_back,
            cutoff = %cutoff,
            sources = sources.len(),
            "Fetching recent news"
        );

        let mut all_items = Vec::new();
        for source in sources {
            match self.fetch_source(source, cutoff, now).await {
                Ok(items) => {
                    info!(source = %source.name, count = items.len(), "Fetched source");
                    all_items.extend(items);
                }
                Err(e) => {
                    warn!(source = %source.name, error = %e, "Skipping unreachable source");
                }
            }
        }

        info!(total = all_items.len(), "Finished fetching all sources");
        all_items
    }

    async fn fetch_source(
        &self,
        source: &FeedSource,
        cutoff: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Vec<NewsItem>> {
        debug!(source = %source.name, url = %source.url, "Fetching feed");

        let response = self.client.get(&source.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DigestError::FeedParse(format!(
                "HTTP {} from {}",
                status, source.url
            )));
        }

        let body = response.bytes().await?;
        let feed = parser::parse(body.as_ref())
            .map_err(|e| DigestError::FeedParse(format!("{}: {}", source.url, e)))?;

        Ok(collect_items(feed, &source.name, cutoff, now))
    }
}

/// Normalize a parsed feed into `NewsItem`s, keeping only entries at or after
/// the cutoff (boundary inclusive).
pub fn collect_items(
    feed: Feed,
    source_name: &str,
    cutoff: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Vec<NewsItem> {
    feed.entries
        .into_iter()
        .filter_map(|entry| normalize_entry(entry, source_name, now))
        .filter(|item| item.published >= cutoff)
        .collect()
}

fn normalize_entry(entry: Entry, source_name: &str, now: DateTime<Utc>) -> Option<NewsItem> {
    let title = entry.title.as_ref().map(|t| t.content.trim().to_string())?;
    if title.is_empty() {
        return None;
    }
    let link = entry.links.first()?.href.clone();
    let published = resolve_published(&entry, now);

    let summary = entry
        .summary
        .map(|s| s.content)
        .unwrap_or_else(|| title.clone());
    let summary: String = summary.chars().take(SUMMARY_MAX_CHARS).collect();

    Some(NewsItem {
        title,
        link,
        summary,
        published,
        source: source_name.to_string(),
    })
}

/// Ordered timestamp fallback chain: the feed's published field, then its
/// updated field, then the current time. An approximate timestamp is better
/// than dropping the entry.
fn resolve_published(entry: &Entry, now: DateTime<Utc>) -> DateTime<Utc> {
    [entry.published, entry.updated]
        .into_iter()
        .flatten()
        .map(|dt| dt.with_timezone(&Utc))
        .next()
        .unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn parse(xml: &str) -> Feed {
        parser::parse(xml.as_bytes()).expect("test feed should parse")
    }

    fn rss(items: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>Test Feed</title>{items}</channel></rss>"#
        )
    }

    #[test]
    fn cutoff_boundary_is_inclusive() {
        let xml = rss(
            r#"<item><title>At cutoff</title><link>https://example.com/a</link>
                 <pubDate>Mon, 25 Aug 2025 12:00:00 GMT</pubDate></item>
               <item><title>Before cutoff</title><link>https://example.com/b</link>
                 <pubDate>Mon, 25 Aug 2025 11:59:59 GMT</pubDate></item>
               <item><title>After cutoff</title><link>https://example.com/c</link>
                 <pubDate>Mon, 25 Aug 2025 13:00:00 GMT</pubDate></item>"#,
        );
        let cutoff = Utc.with_ymd_and_hms(2025, 8, 25, 12, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 8, 25, 14, 0, 0).unwrap();

        let items = collect_items(parse(&xml), "Test", cutoff, now);
        let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["At cutoff", "After cutoff"]);
    }

    #[test]
    fn entry_without_dates_gets_current_time() {
        let xml = rss(
            r#"<item><title>Undated</title><link>https://example.com/a</link></item>"#,
        );
        let cutoff = Utc.with_ymd_and_hms(2025, 8, 25, 12, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 8, 25, 14, 0, 0).unwrap();

        let items = collect_items(parse(&xml), "Test", cutoff, now);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].published, now);
    }

    #[test]
    fn updated_field_used_when_published_missing() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Feed</title>
  <entry>
    <title>Updated only</title>
    <link href="https://example.com/a"/>
    <updated>2025-08-25T13:30:00Z</updated>
  </entry>
</feed>"#;
        let cutoff = Utc.with_ymd_and_hms(2025, 8, 25, 12, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 8, 25, 14, 0, 0).unwrap();

        let items = collect_items(parse(xml), "Atom", cutoff, now);
        assert_eq!(items.len(), 1);
        assert_eq!(
            items[0].published,
            Utc.with_ymd_and_hms(2025, 8, 25, 13, 30, 0).unwrap()
        );
    }

    #[test]
    fn entry_without_link_is_skipped() {
        let xml = rss(
            r#"<item><title>No link</title>
                 <pubDate>Mon, 25 Aug 2025 13:00:00 GMT</pubDate></item>
               <item><title>Has link</title><link>https://example.com/b</link>
                 <pubDate>Mon, 25 Aug 2025 13:00:00 GMT</pubDate></item>"#,
        );
        let cutoff = Utc.with_ymd_and_hms(2025, 8, 25, 12, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 8, 25, 14, 0, 0).unwrap();

        let items = collect_items(parse(&xml), "Test", cutoff, now);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Has link");
    }

    #[test]
    fn missing_summary_falls_back_to_title() {
        let xml = rss(
            r#"<item><title>Bare headline</title><link>https://example.com/a</link>
                 <pubDate>Mon, 25 Aug 2025 13:00:00 GMT</pubDate></item>"#,
        );
        let cutoff = Utc.with_ymd_and_hms(2025, 8, 25, 12, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 8, 25, 14, 0, 0).unwrap();

        let items = collect_items(parse(&xml), "Test", cutoff, now);
        assert_eq!(items[0].summary, "Bare headline");
    }

    #[test]
    fn long_summary_is_truncated() {
        let long_summary = "x".repeat(500);
        let xml = rss(&format!(
            r#"<item><title>Long</title><link>https://example.com/a</link>
                 <description>{long_summary}</description>
                 <pubDate>Mon, 25 Aug 2025 13:00:00 GMT</pubDate></item>"#
        ));
        let cutoff = Utc.with_ymd_and_hms(2025, 8, 25, 12, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 8, 25, 14, 0, 0).unwrap();

        let items = collect_items(parse(&xml), "Test", cutoff, now);
        assert_eq!(items[0].summary.chars().count(), SUMMARY_MAX_CHARS);
    }

    async fn spawn_feed_server(body: String) -> std::net::SocketAddr {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/rss+xml\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
        });
        addr
    }

    #[tokio::test]
    async fn unreachable_source_does_not_abort_the_run() {
        // Undated entry resolves to the current time, so it is always inside
        // the recency window.
        let body = rss(
            r#"<item><title>Live entry</title><link>https://example.com/live</link></item>"#,
        );
        let addr = spawn_feed_server(body).await;

        let fetcher = FeedFetcher::new(&FetchConfig::default()).unwrap();
        let sources = vec![
            FeedSource::new("Dead", "http://127.0.0.1:1/feed"),
            FeedSource::new("Live", format!("http://{addr}/feed")),
        ];

        let items = fetcher.fetch_recent(&sources, 24).await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].source, "Live");
        assert_eq!(items[0].title, "Live entry");
    }

    #[tokio::test]
    async fn all_sources_unreachable_yields_empty_result() {
        let fetcher = FeedFetcher::new(&FetchConfig::default()).unwrap();
        let sources = vec![
            FeedSource::new("Dead A", "http://127.0.0.1:1/feed"),
            FeedSource::new("Dead B", "http://127.0.0.1:1/other"),
        ];

        let items = fetcher.fetch_recent(&sources, 24).await;
        assert!(items.is_empty());
    }

    #[test]
    fn source_name_is_attached_to_every_item() {
        let xml = rss(
            r#"<item><title>A</title><link>https://example.com/a</link>
                 <pubDate>Mon, 25 Aug 2025 13:00:00 GMT</pubDate></item>"#,
        );
        let cutoff = Utc.with_ymd_and_hms(2025, 8, 25, 12, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 8, 25, 14, 0, 0).unwrap();

        let items = collect_items(parse(&xml), "TechCrunch", cutoff, now);
        assert_eq!(items[0].source, "TechCrunch");
    }
}
