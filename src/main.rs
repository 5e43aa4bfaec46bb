use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;

mod ai;
mod config;
mod content;
mod db;
mod error;
mod feed;
mod models;
mod telegram;
mod time_utils;
mod worker;

use ai::{Provider, Summarizer, SummaryConfig};
use config::Config;
use content::ContentFetcher;
use db::FeedRegistry;
use error::Result;
use feed::FeedFetcher;
use telegram::{CommandDispatcher, TelegramClient};
use worker::{BotWorker, FeedWorker, WorkerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load()?;
    let registry = FeedRegistry::open(&config.db_path).await?;

    for url in &config.seed_feeds {
        if registry.ensure_seeded(url).await? {
            tracing::info!("Seeded feed: {}", url);
        }
    }

    let provider = match config.summary_provider.as_str() {
        "openai" => Provider::OpenAi,
        _ => Provider::Gemini,
    };
    let summarizer = Summarizer::new(SummaryConfig {
        provider,
        gemini_api_key: config.gemini_api_key.clone().unwrap_or_default(),
        gemini_model: config.gemini_model.clone(),
        openai_api_key: config.openai_api_key.clone().unwrap_or_default(),
        openai_model: config.openai_model.clone(),
    });

    let token = config.bot_token().to_string();
    let worker: BotWorker = FeedWorker::new(
        registry.clone(),
        FeedFetcher::new(),
        ContentFetcher::new(),
        summarizer,
        TelegramClient::new(token.clone()),
        WorkerConfig {
            channel_id: config.channel_id().to_string(),
            quiet_start_hour: config.quiet_start_hour,
            quiet_end_hour: config.quiet_end_hour,
        },
    );
    let worker = Arc::new(Mutex::new(worker));

    spawn_poll_loop(Arc::clone(&worker), config.poll_interval_minutes);

    let dispatcher = CommandDispatcher::new(
        registry,
        worker,
        TelegramClient::new(token),
        config.admin_user_ids.clone(),
    );

    tracing::info!("rss-digest-bot started");
    dispatcher.run().await;

    Ok(())
}

/// The first poll runs shortly after boot instead of immediately, giving
/// the command dispatcher time to come up before a large backlog is sent.
const STARTUP_DELAY: Duration = Duration::from_secs(10);

/// Scheduled polling. The interval waits for a running tick to finish
/// before starting the next one, so ticks never overlap.
fn spawn_poll_loop(worker: Arc<Mutex<BotWorker>>, interval_minutes: u32) {
    let period = poll_period(interval_minutes);
    tokio::spawn(async move {
        let start = tokio::time::Instant::now() + STARTUP_DELAY;
        let mut interval = tokio::time::interval_at(start, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let worker = worker.lock().await;
            if let Err(e) = worker.run_once().await {
                tracing::error!("Poll tick failed: {}", e);
            }
        }
    });
}

fn poll_period(interval_minutes: u32) -> Duration {
    Duration::from_secs(u64::from(interval_minutes.max(1)) * 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_period_clamps_to_one_minute() {
        assert_eq!(poll_period(0), Duration::from_secs(60));
        assert_eq!(poll_period(60), Duration::from_secs(3600));
    }
}
