use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::db::FeedRegistry;
use crate::error::AppError;
use crate::feed::FeedFetcher;
use crate::models::FetchedFeed;
use crate::worker::BotWorker;

use super::client::{Message, TelegramClient};
use super::format::escape_html;

/// Pause between getUpdates attempts after a transport error.
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Parses and executes admin commands arriving over getUpdates.
///
/// Every command produces a human-readable reply, success or failure. The
/// worker is shared behind a mutex so a manual `/runonce` queues behind a
/// scheduled tick instead of overlapping it.
pub struct CommandDispatcher {
    registry: FeedRegistry,
    worker: Arc<Mutex<BotWorker>>,
    client: TelegramClient,
    fetcher: FeedFetcher,
    admin_user_ids: Vec<i64>,
}

impl CommandDispatcher {
    pub fn new(
        registry: FeedRegistry,
        worker: Arc<Mutex<BotWorker>>,
        client: TelegramClient,
        admin_user_ids: Vec<i64>,
    ) -> Self {
        Self {
            registry,
            worker,
            client,
            fetcher: FeedFetcher::new(),
            admin_user_ids,
        }
    }

    /// Long-poll loop. Never returns under normal operation.
    pub async fn run(&self) {
        let mut offset = 0i64;
        loop {
            match self.client.get_updates(offset).await {
                Ok(updates) => {
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        if let Some(message) = update.message {
                            self.handle_message(message).await;
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("getUpdates failed: {}", e);
                    tokio::time::sleep(RETRY_DELAY).await;
                }
            }
        }
    }

    async fn handle_message(&self, message: Message) {
        let Some(text) = message.text.as_deref() else {
            return;
        };
        if !text.starts_with('/') {
            return;
        }
        let chat_id = message.chat.id.to_string();

        let reply = if !self.is_authorized(&message) {
            "You are not authorized to use this bot.".to_string()
        } else {
            let mut parts = text.split_whitespace();
            let command = parts
                .next()
                .map(|c| c.split('@').next().unwrap_or(c))
                .unwrap_or_default();
            let arg = parts.next();

            match command {
                "/add" => self.cmd_add(&chat_id, arg).await,
                "/list" => self.cmd_list().await,
                "/remove" => self.cmd_remove(arg).await,
                "/pause" => self.cmd_set_paused(arg, true).await,
                "/resume" => self.cmd_set_paused(arg, false).await,
                "/runonce" => self.cmd_run_once(&chat_id).await,
                _ => return,
            }
        };

        self.reply(&chat_id, &reply).await;
    }

    fn is_authorized(&self, message: &Message) -> bool {
        if self.admin_user_ids.is_empty() {
            return true;
        }
        message
            .from
            .as_ref()
            .is_some_and(|user| self.admin_user_ids.contains(&user.id))
    }

    async fn cmd_add(&self, chat_id: &str, arg: Option<&str>) -> String {
        let Some(url) = arg else {
            return "Usage: /add <rss_or_atom_url>".to_string();
        };
        if url::Url::parse(url).is_err() {
            return format!("That doesn't look like a valid URL: {url}");
        }

        self.reply(chat_id, "Checking feed...").await;
        let fetched = self.fetcher.fetch_feed(url).await;
        if !looks_like_feed(&fetched) {
            return format!(
                "Could not find a valid RSS/Atom feed at {url}.\n\
                 Make sure this is a feed URL, not a regular web page\n\
                 (e.g. https://example.com/feed or https://example.com/rss)."
            );
        }

        match self.registry.add_feed(url).await {
            Ok(id) => added_reply(id, fetched.title.as_deref(), fetched.entries.len()),
            Err(AppError::DuplicateFeed(_)) => "That feed is already registered.".to_string(),
            Err(e) => format!("Failed to add feed: {e}"),
        }
    }

    async fn cmd_list(&self) -> String {
        match self.registry.list_feeds().await {
            Ok(feeds) if feeds.is_empty() => "No feeds registered.".to_string(),
            Ok(feeds) => feeds
                .iter()
                .map(|f| {
                    let status = if f.paused { "paused" } else { "active" };
                    format!("{}. [{}] {}", f.id, status, f.url)
                })
                .collect::<Vec<_>>()
                .join("\n"),
            Err(e) => format!("Failed to list feeds: {e}"),
        }
    }

    async fn cmd_remove(&self, arg: Option<&str>) -> String {
        let Some(arg) = arg else {
            return "Usage: /remove <id|url>".to_string();
        };
        let Some(id) = self.resolve_feed_id(arg).await else {
            return "Feed not found.".to_string();
        };
        match self.registry.remove_feed(id).await {
            Ok(true) => format!("Removed feed {id}."),
            Ok(false) => "Feed not found.".to_string(),
            Err(e) => format!("Failed to remove feed: {e}"),
        }
    }

    async fn cmd_set_paused(&self, arg: Option<&str>, paused: bool) -> String {
        let (verb, usage) = if paused {
            ("Paused", "Usage: /pause <id|url>")
        } else {
            ("Resumed", "Usage: /resume <id|url>")
        };
        let Some(arg) = arg else {
            return usage.to_string();
        };
        let Some(id) = self.resolve_feed_id(arg).await else {
            return "Feed not found.".to_string();
        };
        match self.registry.set_paused(id, paused).await {
            Ok(true) => format!("{verb} feed {id}."),
            Ok(false) => "Feed not found.".to_string(),
            Err(e) => format!("Failed to update feed: {e}"),
        }
    }

    async fn cmd_run_once(&self, chat_id: &str) -> String {
        self.reply(chat_id, "Running one poll cycle...").await;
        let worker = self.worker.lock().await;
        match worker.run_once().await {
            Ok(()) => "Poll cycle complete.".to_string(),
            Err(e) => format!("Poll cycle failed: {e}"),
        }
    }

    /// Accepts either a numeric feed id or a registered feed URL.
    async fn resolve_feed_id(&self, value: &str) -> Option<i64> {
        if let Ok(id) = value.trim().parse::<i64>() {
            return Some(id);
        }
        match self.registry.find_feed_by_url(value).await {
            Ok(feed) => feed.map(|f| f.id),
            Err(e) => {
                tracing::warn!("Feed lookup failed: {}", e);
                None
            }
        }
    }

    async fn reply(&self, chat_id: &str, text: &str) {
        if let Err(e) = self.client.send_message(chat_id, &escape_html(text)).await {
            tracing::warn!("Failed to send reply: {}", e);
        }
    }
}

/// A document counts as a feed when it yielded entries or at least carries a
/// feed title. A parsed-but-empty channel is still registrable.
fn looks_like_feed(fetched: &FetchedFeed) -> bool {
    !fetched.entries.is_empty() || fetched.title.is_some()
}

fn added_reply(id: i64, title: Option<&str>, entry_count: usize) -> String {
    match title {
        Some(title) => format!("Added \"{title}\" (id={id}), {entry_count} entries found"),
        None => format!("Added feed id={id}, {entry_count} entries found"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawFeedEntry;

    fn entry(uid: &str) -> RawFeedEntry {
        RawFeedEntry {
            uid: uid.to_string(),
            title: uid.to_string(),
            link: format!("https://example.com/{uid}"),
        }
    }

    #[test]
    fn test_added_reply_includes_feed_title() {
        let reply = added_reply(3, Some("Market Notes"), 12);
        assert_eq!(reply, "Added \"Market Notes\" (id=3), 12 entries found");
    }

    #[test]
    fn test_added_reply_without_title() {
        let reply = added_reply(3, None, 12);
        assert_eq!(reply, "Added feed id=3, 12 entries found");
    }

    #[test]
    fn test_looks_like_feed_rejects_untitled_empty_document() {
        let fetched = FetchedFeed {
            malformed: true,
            ..Default::default()
        };
        assert!(!looks_like_feed(&fetched));
    }

    #[test]
    fn test_looks_like_feed_accepts_titled_empty_channel() {
        let fetched = FetchedFeed {
            malformed: false,
            title: Some("Quiet Blog".to_string()),
            entries: Vec::new(),
        };
        assert!(looks_like_feed(&fetched));
    }

    #[test]
    fn test_looks_like_feed_accepts_entries_without_title() {
        let fetched = FetchedFeed {
            malformed: false,
            title: None,
            entries: vec![entry("a")],
        };
        assert!(looks_like_feed(&fetched));
    }
}
