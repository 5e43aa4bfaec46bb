use std::time::Duration;

use reqwest::Client;

use super::extract::extract_main_text;

const USER_AGENT_STRING: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// Fetches article pages and extracts their main text.
pub struct ContentFetcher {
    client: Client,
}

impl ContentFetcher {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(20))
            .user_agent(USER_AGENT_STRING)
            .build()
            .expect("Failed to create HTTP client");
        Self { client }
    }

    /// Fetch the page at `url`. Any failure, including HTTP >= 400, becomes
    /// `None` — page fetch problems are never fatal to the pipeline.
    pub async fn fetch_html(&self, url: &str) -> Option<String> {
        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("Failed to fetch {}: {}", url, e);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::debug!("Failed to fetch {}: {}", url, response.status());
            return None;
        }

        response.text().await.ok()
    }

    /// Extract readable main text from fetched HTML. Empty string means
    /// extraction failed for this page.
    pub fn extract_text(&self, url: &str, html: Option<&str>) -> String {
        let Some(html) = html else {
            return String::new();
        };
        extract_main_text(url, html)
    }
}

impl Default for ContentFetcher {
    fn default() -> Self {
        Self::new()
    }
}
