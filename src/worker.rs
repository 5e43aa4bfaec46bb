use std::collections::HashSet;
use std::future::Future;

use chrono::{DateTime, Utc};

use crate::ai::Summarizer;
use crate::content::{is_probably_paid_substack, is_substack_url, ContentFetcher};
use crate::db::FeedRegistry;
use crate::error::Result;
use crate::feed::{select_batch, FeedFetcher};
use crate::models::{Feed, FetchedFeed, RawFeedEntry};
use crate::telegram::{clamp_message, escape_html, TelegramClient};
use crate::time_utils::in_quiet_hours;

/// Result of processing one entry.
///
/// `Delivered` and `Skipped` both count as handled: the caller marks the
/// entry seen. Only `Deferred` leaves the seen-set untouched so the entry
/// is retried on a later tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Delivered,
    Skipped,
    Deferred,
}

// Collaborator seams. Network-facing dependencies sit behind these traits
// so the worker can be exercised with stubs.

pub trait FeedSource: Send + Sync {
    fn fetch_feed(&self, url: &str) -> impl Future<Output = FetchedFeed> + Send;
}

pub trait ContentSource: Send + Sync {
    fn fetch_html(&self, url: &str) -> impl Future<Output = Option<String>> + Send;
    fn extract_text(&self, url: &str, html: Option<&str>) -> String;
}

pub trait Summarize: Send + Sync {
    fn summarize(
        &self,
        title: &str,
        url: &str,
        content: &str,
    ) -> impl Future<Output = Option<String>> + Send;
}

pub trait Deliver: Send + Sync {
    fn send_html(&self, chat_id: &str, text: &str) -> impl Future<Output = Result<()>> + Send;
}

impl FeedSource for FeedFetcher {
    async fn fetch_feed(&self, url: &str) -> FetchedFeed {
        FeedFetcher::fetch_feed(self, url).await
    }
}

impl ContentSource for ContentFetcher {
    async fn fetch_html(&self, url: &str) -> Option<String> {
        ContentFetcher::fetch_html(self, url).await
    }

    fn extract_text(&self, url: &str, html: Option<&str>) -> String {
        ContentFetcher::extract_text(self, url, html)
    }
}

impl Summarize for Summarizer {
    async fn summarize(&self, title: &str, url: &str, content: &str) -> Option<String> {
        Summarizer::summarize(self, title, url, content).await
    }
}

impl Deliver for TelegramClient {
    async fn send_html(&self, chat_id: &str, text: &str) -> Result<()> {
        self.send_message(chat_id, text).await
    }
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub channel_id: String,
    pub quiet_start_hour: u32,
    pub quiet_end_hour: u32,
}

/// The polling pipeline: quiet-hours gate, active-feed iteration, batch
/// selection, per-entry processing, and seen-marking.
pub struct FeedWorker<F, C, S, D> {
    registry: FeedRegistry,
    feeds: F,
    content: C,
    summarizer: S,
    delivery: D,
    config: WorkerConfig,
}

/// Production worker wiring.
pub type BotWorker = FeedWorker<FeedFetcher, ContentFetcher, Summarizer, TelegramClient>;

impl<F, C, S, D> FeedWorker<F, C, S, D>
where
    F: FeedSource,
    C: ContentSource,
    S: Summarize,
    D: Deliver,
{
    pub fn new(
        registry: FeedRegistry,
        feeds: F,
        content: C,
        summarizer: S,
        delivery: D,
        config: WorkerConfig,
    ) -> Self {
        Self {
            registry,
            feeds,
            content,
            summarizer,
            delivery,
            config,
        }
    }

    /// One full poll tick across all active feeds. A tick inside quiet
    /// hours is a no-op: no feeds touched, no seen-marks.
    pub async fn run_once(&self) -> Result<()> {
        self.run_at(Utc::now()).await
    }

    async fn run_at(&self, now: DateTime<Utc>) -> Result<()> {
        if in_quiet_hours(
            self.config.quiet_start_hour,
            self.config.quiet_end_hour,
            now,
        ) {
            tracing::info!("Quiet hours: skip feed polling");
            return Ok(());
        }

        for feed in self.registry.active_feeds().await? {
            self.process_feed(&feed).await?;
        }
        Ok(())
    }

    async fn process_feed(&self, feed: &Feed) -> Result<()> {
        let fetched = self.feeds.fetch_feed(&feed.url).await;
        if fetched.malformed {
            tracing::warn!("Feed fetch failed or malformed [{}]", feed.url);
        }
        tracing::info!(
            "Feed [{}]: {} entries fetched",
            feed.url,
            fetched.entries.len()
        );

        let mut seen = HashSet::new();
        for entry in &fetched.entries {
            if self.registry.has_seen(feed.id, &entry.uid).await? {
                seen.insert(entry.uid.clone());
            }
        }

        // Oldest-first batch; one bad entry never aborts the rest.
        for entry in select_batch(&fetched.entries, &seen) {
            match self.process_entry(&entry).await {
                Outcome::Delivered | Outcome::Skipped => {
                    self.registry.mark_seen(feed.id, &entry.uid).await?;
                }
                Outcome::Deferred => {}
            }
        }
        Ok(())
    }

    async fn process_entry(&self, entry: &RawFeedEntry) -> Outcome {
        if entry.link.is_empty() {
            return Outcome::Deferred;
        }

        tracing::info!("Processing entry: {}", entry.title);
        let html = self.content.fetch_html(&entry.link).await;

        if is_substack_url(&entry.link)
            && is_probably_paid_substack(&entry.title, &entry.link, html.as_deref())
        {
            tracing::info!("Skipping paid/suspected-paid Substack post: {}", entry.title);
            return Outcome::Skipped;
        }

        let main_text = self.content.extract_text(&entry.link, html.as_deref());
        if main_text.is_empty() {
            tracing::warn!("Failed to extract text from: {}", entry.link);
            let notice = format!(
                "<b>{}</b>\nFailed to extract article text. Link: {}",
                escape_html(&entry.title),
                escape_html(&entry.link)
            );
            // Extraction failures are typically permanent for a URL; report
            // once and move on rather than retrying every tick.
            return match self.send(&notice).await {
                Ok(()) => Outcome::Skipped,
                Err(_) => Outcome::Deferred,
            };
        }

        let Some(summary) = self
            .summarizer
            .summarize(&entry.title, &entry.link, &main_text)
            .await
        else {
            tracing::warn!("Summarizer returned nothing for: {}", entry.title);
            return Outcome::Deferred;
        };

        let message = format!(
            "<b>{}</b>\n{}\n\n{}",
            escape_html(&entry.title),
            escape_html(&entry.link),
            escape_html(&summary)
        );
        match self.send(&message).await {
            Ok(()) => Outcome::Delivered,
            Err(e) => {
                tracing::warn!("Delivery failed for {}: {}", entry.link, e);
                Outcome::Deferred
            }
        }
    }

    async fn send(&self, text: &str) -> Result<()> {
        self.delivery
            .send_html(&self.config.channel_id, &clamp_message(text))
            .await
    }
}
