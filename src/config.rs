use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub telegram_bot_token: Option<String>,
    pub telegram_channel_id: Option<String>,

    #[serde(default)]
    pub admin_user_ids: Vec<i64>,

    #[serde(default = "default_db_path")]
    pub db_path: String,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_minutes: u32,

    #[serde(default = "default_quiet_start_hour")]
    pub quiet_start_hour: u32,

    #[serde(default = "default_quiet_end_hour")]
    pub quiet_end_hour: u32,

    #[serde(default)]
    pub seed_feeds: Vec<String>,

    #[serde(default = "default_summary_provider")]
    pub summary_provider: String,

    #[serde(default)]
    pub gemini_api_key: Option<String>,
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rss-digest-bot");
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("feeds.db").to_string_lossy().to_string()
}

fn default_poll_interval() -> u32 {
    60
}

fn default_quiet_start_hour() -> u32 {
    23
}

fn default_quiet_end_hour() -> u32 {
    8
}

fn default_summary_provider() -> String {
    "gemini".to_string()
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            telegram_bot_token: None,
            telegram_channel_id: None,
            admin_user_ids: Vec::new(),
            db_path: default_db_path(),
            poll_interval_minutes: default_poll_interval(),
            quiet_start_hour: default_quiet_start_hour(),
            quiet_end_hour: default_quiet_end_hour(),
            seed_feeds: Vec::new(),
            summary_provider: default_summary_provider(),
            gemini_api_key: None,
            gemini_model: default_gemini_model(),
            openai_api_key: None,
            openai_model: default_openai_model(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            // Write a template so the user has something to fill in, then
            // fail loudly: the bot cannot run without credentials.
            let config = Config::default();
            config.save()?;
            Err(AppError::Config(format!(
                "created template config at {}; set telegram_bot_token and telegram_channel_id",
                config_path.display()
            )))
        }
    }

    fn validate(&self) -> Result<()> {
        let missing_token = self
            .telegram_bot_token
            .as_deref()
            .map_or(true, |t| t.trim().is_empty());
        let missing_channel = self
            .telegram_channel_id
            .as_deref()
            .map_or(true, |c| c.trim().is_empty());
        if missing_token || missing_channel {
            return Err(AppError::Config(
                "telegram_bot_token and telegram_channel_id are required".to_string(),
            ));
        }

        if self.quiet_start_hour > 23 || self.quiet_end_hour > 23 {
            return Err(AppError::Config(
                "quiet hours must be in 0..=23".to_string(),
            ));
        }

        Ok(())
    }

    /// Bot token, guaranteed non-empty after `load`.
    pub fn bot_token(&self) -> &str {
        self.telegram_bot_token.as_deref().unwrap_or_default()
    }

    /// Destination channel id, guaranteed non-empty after `load`.
    pub fn channel_id(&self) -> &str {
        self.telegram_channel_id.as_deref().unwrap_or_default()
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rss-digest-bot")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credentials_fail_validation() {
        let config = Config::default();
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn out_of_range_quiet_hours_fail_validation() {
        let config = Config {
            telegram_bot_token: Some("token".to_string()),
            telegram_channel_id: Some("@channel".to_string()),
            quiet_start_hour: 24,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn defaults_parse_from_minimal_toml() {
        let config: Config = toml::from_str(
            r#"
            telegram_bot_token = "token"
            telegram_channel_id = "@channel"
            "#,
        )
        .unwrap();
        config.validate().unwrap();
        assert_eq!(config.poll_interval_minutes, 60);
        assert_eq!(config.quiet_start_hour, 23);
        assert_eq!(config.quiet_end_hour, 8);
        assert_eq!(config.summary_provider, "gemini");
    }
}
