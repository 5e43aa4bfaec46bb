mod client;
mod commands;
mod format;

pub use client::TelegramClient;
pub use commands::CommandDispatcher;
pub use format::{clamp_message, escape_html};
