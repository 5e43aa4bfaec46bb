/// Minimum cleaned length to count as a real article body. Shorter results
/// are usually navigation chrome and produce useless summaries.
const MIN_CONTENT_LEN: usize = 200;

/// Convert article HTML to plain text and clean it up. Returns an empty
/// string when nothing usable comes out.
pub fn extract_main_text(url: &str, html: &str) -> String {
    let text = match html2text::from_read(html.as_bytes(), 80) {
        Ok(t) => t,
        Err(e) => {
            tracing::debug!("Failed to convert HTML to text for {}: {}", url, e);
            return String::new();
        }
    };

    // Clean up the text - remove excessive whitespace
    let cleaned: String = text
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    if cleaned.len() >= MIN_CONTENT_LEN {
        cleaned
    } else {
        tracing::debug!(
            "Extracted content too short ({} chars) for {}",
            cleaned.len(),
            url
        );
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_body_text_from_simple_page() {
        let body = "word ".repeat(100);
        let html = format!("<html><body><article><p>{body}</p></article></body></html>");
        let text = extract_main_text("https://example.com/p/1", &html);
        assert!(text.contains("word"));
        assert!(text.len() >= MIN_CONTENT_LEN);
    }

    #[test]
    fn short_pages_yield_empty_text() {
        let html = "<html><body><p>nav | home</p></body></html>";
        assert_eq!(extract_main_text("https://example.com", html), "");
    }
}
