use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use std::time::Duration;

/// One syndication-feed entry, as handed to the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct NewsItem {
    pub title: String,
    pub link: String,
    pub published: Option<String>,
    pub source: Option<String>,
}

/// Seam for the headline fetch, mirroring the market-side EventSource.
#[async_trait]
pub trait HeadlineSource: Send + Sync {
    async fn fetch_headlines(&self, limit: usize) -> Result<Vec<NewsItem>>;
}

pub struct NewsClient {
    client: Client,
    feed_url: String,
}

impl NewsClient {
    pub fn new(feed_url: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, feed_url })
    }
}

#[async_trait]
impl HeadlineSource for NewsClient {
    async fn fetch_headlines(&self, limit: usize) -> Result<Vec<NewsItem>> {
        let body = self
            .client
            .get(&self.feed_url)
            .send()
            .await
            .context("Failed to reach news feed")?
            .text()
            .await
            .context("Failed to read news feed body")?;

        parse_feed_items(&body, limit)
    }
}

/// Pull title/link/pubDate/source out of each RSS `<item>` block.
///
/// The feed is machine-generated and flat, so a bounded tag scan covers
/// it; items missing a title or link are dropped individually.
pub fn parse_feed_items(body: &str, limit: usize) -> Result<Vec<NewsItem>> {
    let item_re = Regex::new(r"(?s)<item>(.*?)</item>")?;
    let title_re = Regex::new(r"(?s)<title>(?:<!\[CDATA\[)?(.*?)(?:\]\]>)?</title>")?;
    let link_re = Regex::new(r"(?s)<link>(.*?)</link>")?;
    let date_re = Regex::new(r"(?s)<pubDate>(.*?)</pubDate>")?;
    let source_re = Regex::new(r"(?s)<source[^>]*>(.*?)</source>")?;

    let mut items = Vec::new();
    for captures in item_re.captures_iter(body).take(limit) {
        let block = &captures[1];

        let title = match title_re.captures(block) {
            Some(c) => c[1].trim().to_string(),
            None => continue,
        };
        let link = match link_re.captures(block) {
            Some(c) => c[1].trim().to_string(),
            None => continue,
        };
        if title.is_empty() || link.is_empty() {
            continue;
        }

        items.push(NewsItem {
            title,
            link,
            published: date_re.captures(block).map(|c| c[1].trim().to_string()),
            source: source_re.captures(block).map(|c| c[1].trim().to_string()),
        });
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_FEED: &str = r#"<?xml version="1.0"?>
        <rss version="2.0"><channel>
        <title>Search results</title>
        <item>
            <title><![CDATA[Strike talks intensify]]></title>
            <link>https://example.com/a</link>
            <pubDate>Mon, 16 Feb 2026 09:00:00 GMT</pubDate>
            <source url="https://example.com">Example Wire</source>
        </item>
        <item>
            <title>Second headline</title>
            <link>https://example.com/b</link>
        </item>
        <item>
            <title>No link here</title>
        </item>
        </channel></rss>"#;

    #[test]
    fn test_parse_feed_items() {
        let items = parse_feed_items(SAMPLE_FEED, 8).unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Strike talks intensify");
        assert_eq!(items[0].link, "https://example.com/a");
        assert_eq!(
            items[0].published.as_deref(),
            Some("Mon, 16 Feb 2026 09:00:00 GMT")
        );
        assert_eq!(items[0].source.as_deref(), Some("Example Wire"));

        // Optional fields stay optional
        assert_eq!(items[1].published, None);
        assert_eq!(items[1].source, None);
    }

    #[test]
    fn test_parse_feed_respects_limit() {
        let items = parse_feed_items(SAMPLE_FEED, 1).unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_parse_feed_empty_body() {
        let items = parse_feed_items("", 8).unwrap();
        assert!(items.is_empty());
    }
}
