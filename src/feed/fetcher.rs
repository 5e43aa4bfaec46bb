use std::time::Duration;

use feed_rs::parser;
use reqwest::Client;

use crate::error::Result;
use crate::models::{FetchedFeed, RawFeedEntry};

pub struct FeedFetcher {
    client: Client,
}

impl FeedFetcher {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("rss-digest-bot/1.0")
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }

    /// Fetch and normalize one feed. Transport and parse failures are folded
    /// into `malformed` instead of raised; the caller logs and moves on.
    pub async fn fetch_feed(&self, url: &str) -> FetchedFeed {
        match self.try_fetch(url).await {
            Ok(fetched) => fetched,
            Err(e) => {
                tracing::debug!("Feed fetch failed [{}]: {}", url, e);
                FetchedFeed {
                    malformed: true,
                    ..Default::default()
                }
            }
        }
    }

    async fn try_fetch(&self, url: &str) -> Result<FetchedFeed> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!("Failed to fetch feed: HTTP {}", response.status()).into());
        }

        let bytes = response.bytes().await?;
        let feed = parser::parse(&bytes[..])?;

        Ok(normalize(feed))
    }
}

fn normalize(feed: feed_rs::model::Feed) -> FetchedFeed {
    let feed_title = feed
        .title
        .map(|t| t.content)
        .filter(|t| !t.trim().is_empty());

    let mut dated: Vec<_> = feed
        .entries
        .into_iter()
        .map(|entry| {
            let published = entry.published.or(entry.updated);
            let title = entry
                .title
                .map(|t| t.content)
                .unwrap_or_else(|| "Untitled".to_string());
            let link = entry
                .links
                .first()
                .map(|l| l.href.clone())
                .unwrap_or_default();

            // uid: provider id, else link, else title.
            let uid = [entry.id.trim(), link.trim(), title.trim()]
                .into_iter()
                .find(|s| !s.is_empty())
                .unwrap_or_default()
                .to_string();

            (published, RawFeedEntry { uid, title, link })
        })
        .filter(|(_, e)| !e.uid.is_empty())
        .collect();

    // The selector depends on newest-first input. Providers almost always
    // deliver that order, but when every entry carries a date we can
    // enforce the contract instead of trusting it.
    if dated.iter().all(|(published, _)| published.is_some()) {
        dated.sort_by(|a, b| b.0.cmp(&a.0));
    }

    FetchedFeed {
        malformed: false,
        title: feed_title,
        entries: dated.into_iter().map(|(_, e)| e).collect(),
    }
}

impl Default for FeedFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(xml: &str) -> FetchedFeed {
        normalize(parser::parse(xml.as_bytes()).unwrap())
    }

    #[test]
    fn test_normalize_carries_feed_title() {
        let fetched = parse(
            r#"<?xml version="1.0"?>
            <rss version="2.0"><channel>
              <title>Market Notes</title>
              <item><title>First</title><link>https://example.com/1</link></item>
            </channel></rss>"#,
        );

        assert_eq!(fetched.title.as_deref(), Some("Market Notes"));
        assert_eq!(fetched.entries.len(), 1);
        assert_eq!(fetched.entries[0].uid, "https://example.com/1");
    }

    #[test]
    fn test_normalize_blank_feed_title_is_none() {
        let fetched = parse(
            r#"<?xml version="1.0"?>
            <rss version="2.0"><channel>
              <title>  </title>
              <item><title>Only</title><link>https://example.com/a</link></item>
            </channel></rss>"#,
        );

        assert!(fetched.title.is_none());
    }

    #[test]
    fn test_normalize_sorts_newest_first_when_all_dated() {
        let fetched = parse(
            r#"<?xml version="1.0"?>
            <rss version="2.0"><channel>
              <title>Dated</title>
              <item><title>Old</title><link>https://example.com/old</link>
                    <pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate></item>
              <item><title>New</title><link>https://example.com/new</link>
                    <pubDate>Mon, 01 Jul 2024 00:00:00 GMT</pubDate></item>
            </channel></rss>"#,
        );

        let titles: Vec<_> = fetched.entries.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["New", "Old"]);
    }
}
