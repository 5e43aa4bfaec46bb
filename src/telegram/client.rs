use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Long-poll wait passed to getUpdates, in seconds.
const GET_UPDATES_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
    disable_web_page_preview: bool,
}

#[derive(Debug, Serialize)]
struct GetUpdatesRequest {
    offset: i64,
    timeout: u64,
    allowed_updates: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub text: Option<String>,
    pub from: Option<User>,
    pub chat: Chat,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// Minimal Telegram Bot API client: message delivery plus the getUpdates
/// long-poll the command dispatcher runs on.
pub struct TelegramClient {
    client: Client,
    token: String,
}

impl TelegramClient {
    pub fn new(token: String) -> Self {
        // Long-poll requests hold the connection open for up to
        // GET_UPDATES_TIMEOUT_SECS, so the client timeout must exceed it.
        let client = Client::builder()
            .timeout(Duration::from_secs(GET_UPDATES_TIMEOUT_SECS + 15))
            .build()
            .expect("Failed to create HTTP client");
        Self { client, token }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", TELEGRAM_API_URL, self.token, method)
    }

    /// Send an HTML-formatted message. The caller is responsible for
    /// escaping dynamic fields and clamping the length.
    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<()> {
        let request = SendMessageRequest {
            chat_id,
            text,
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };

        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::TelegramApi(format!(
                "sendMessage failed: {error_text}"
            )));
        }

        Ok(())
    }

    /// Long-poll for updates past `offset`. Returns an empty list when the
    /// poll times out with nothing new.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>> {
        let request = GetUpdatesRequest {
            offset,
            timeout: GET_UPDATES_TIMEOUT_SECS,
            allowed_updates: vec!["message".to_string()],
        };

        let response = self
            .client
            .post(self.method_url("getUpdates"))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::TelegramApi(format!(
                "getUpdates failed: {error_text}"
            )));
        }

        let body: ApiResponse<Vec<Update>> = response.json().await?;
        if !body.ok {
            return Err(AppError::TelegramApi(
                body.description
                    .unwrap_or_else(|| "getUpdates returned ok=false".to_string()),
            ));
        }

        Ok(body.result.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_updates_envelope_deserializes() {
        let body: ApiResponse<Vec<Update>> = serde_json::from_str(
            r#"{
                "ok": true,
                "result": [{
                    "update_id": 42,
                    "message": {
                        "text": "/list",
                        "from": {"id": 7},
                        "chat": {"id": -100123}
                    }
                }]
            }"#,
        )
        .unwrap();

        assert!(body.ok);
        let updates = body.result.unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].update_id, 42);
        let message = updates[0].message.as_ref().unwrap();
        assert_eq!(message.text.as_deref(), Some("/list"));
        assert_eq!(message.chat.id, -100123);
    }

    #[test]
    fn test_error_envelope_carries_description() {
        let body: ApiResponse<Vec<Update>> =
            serde_json::from_str(r#"{"ok": false, "description": "Unauthorized"}"#).unwrap();

        assert!(!body.ok);
        assert!(body.result.is_none());
        assert_eq!(body.description.as_deref(), Some("Unauthorized"));
    }
}
