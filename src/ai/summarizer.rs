use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Prompt content is clamped to this many characters before the API call.
const MAX_PROMPT_CONTENT_CHARS: usize = 12_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provider {
    Gemini,
    OpenAi,
}

#[derive(Debug, Clone)]
pub struct SummaryConfig {
    pub provider: Provider,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub openai_api_key: String,
    pub openai_model: String,
}

// Gemini generateContent request/response

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiCandidateContent,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

// OpenAI chat completions request/response

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Korean article summarizer with a primary and a fallback provider.
/// Provider failures are logged, never raised: `None` means both failed
/// and the caller should retry the entry on a later tick.
pub struct Summarizer {
    client: Client,
    config: SummaryConfig,
}

impl Summarizer {
    pub fn new(config: SummaryConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");
        Self { client, config }
    }

    pub async fn summarize(&self, title: &str, url: &str, content: &str) -> Option<String> {
        let prompt = build_prompt(title, url, content);

        let (first, second) = match self.config.provider {
            Provider::Gemini => (Provider::Gemini, Provider::OpenAi),
            Provider::OpenAi => (Provider::OpenAi, Provider::Gemini),
        };

        for provider in [first, second] {
            let result = match provider {
                Provider::Gemini => self.summarize_gemini(&prompt).await,
                Provider::OpenAi => self.summarize_openai(&prompt).await,
            };
            if result.is_some() {
                return result;
            }
        }

        None
    }

    async fn summarize_gemini(&self, prompt: &str) -> Option<String> {
        if self.config.gemini_api_key.is_empty() {
            return None;
        }

        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
        };

        let url = format!(
            "{}/{}:generateContent",
            GEMINI_API_URL, self.config.gemini_model
        );

        let response = match self
            .client
            .post(&url)
            .query(&[("key", self.config.gemini_api_key.as_str())])
            .json(&request)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("Gemini request failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::warn!("Gemini API error: HTTP {}", response.status());
            return None;
        }

        let body: GeminiResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!("Gemini response parse failed: {}", e);
                return None;
            }
        };

        let text = body
            .candidates
            .unwrap_or_default()
            .into_iter()
            .flat_map(|c| c.content.parts)
            .filter_map(|p| p.text)
            .collect::<Vec<_>>()
            .join("\n");

        let text = text.trim().to_string();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    async fn summarize_openai(&self, prompt: &str) -> Option<String> {
        if self.config.openai_api_key.is_empty() {
            return None;
        }

        let request = ChatRequest {
            model: self.config.openai_model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let response = match self
            .client
            .post(OPENAI_API_URL)
            .bearer_auth(&self.config.openai_api_key)
            .json(&request)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("OpenAI request failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::warn!("OpenAI API error: HTTP {}", response.status());
            return None;
        }

        let body: ChatResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!("OpenAI response parse failed: {}", e);
                return None;
            }
        };

        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        let text = text.trim().to_string();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

fn build_prompt(title: &str, url: &str, content: &str) -> String {
    let content = clamp_chars(content, MAX_PROMPT_CONTENT_CHARS);
    format!(
        "다음 글을 한국어로 요약하세요.\n\
         출력 형식:\n\
         1) 핵심 요약 (4~6줄)\n\
         2) 주요 논거 3~4개\n\
         3) 투자 관점 체크포인트 2개\n\n\
         제목: {title}\n링크: {url}\n본문:\n{content}"
    )
}

fn clamp_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_chars_respects_utf8_boundaries() {
        let s = "한국어 요약 테스트";
        assert_eq!(clamp_chars(s, 3), "한국어");
        assert_eq!(clamp_chars(s, 100), s);
    }

    #[test]
    fn prompt_contains_title_link_and_clamped_content() {
        let long = "a".repeat(MAX_PROMPT_CONTENT_CHARS + 500);
        let prompt = build_prompt("Title", "https://example.com/p/1", &long);
        assert!(prompt.contains("Title"));
        assert!(prompt.contains("https://example.com/p/1"));
        assert!(prompt.len() < long.len() + 200);
    }

    #[test]
    fn gemini_request_serializes_to_wire_shape() {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: "요약해줘".to_string(),
                }],
            }],
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "contents": [{"parts": [{"text": "요약해줘"}]}]
            })
        );
    }

    #[test]
    fn gemini_response_tolerates_missing_candidates() {
        let body: GeminiResponse = serde_json::from_str("{}").unwrap();
        assert!(body.candidates.is_none());
    }

    #[test]
    fn chat_response_extracts_first_choice() {
        let body: ChatResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": "요약입니다"}}]}"#,
        )
        .unwrap();
        let text = body.choices.into_iter().next().and_then(|c| c.message.content);
        assert_eq!(text.as_deref(), Some("요약입니다"));
    }
}
