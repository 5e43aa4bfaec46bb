use std::sync::OnceLock;

use regex::Regex;

const TITLE_MARKERS: &[&str] = &["paid", "subscriber", "members-only", "members only"];

const PAGE_MARKERS: &[&str] = &[
    "this post is for paid subscribers",
    "become a paid subscriber",
    "subscribe to continue reading",
    "paid subscribers",
];

fn paywall_markup_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"paywall|subscriber-only|premium").unwrap())
}

pub fn is_substack_url(url: &str) -> bool {
    url.to_lowercase().contains("substack.com")
}

/// Heuristic paywall detection for Substack posts: title markers first, then
/// page markers for post URLs (`/p/` path). False negatives are acceptable;
/// a false negative just means we attempt extraction and fall back normally.
pub fn is_probably_paid_substack(title: &str, url: &str, html: Option<&str>) -> bool {
    let title = title.to_lowercase();
    if TITLE_MARKERS.iter().any(|m| title.contains(m)) {
        return true;
    }

    if !url.to_lowercase().contains("/p/") {
        return false;
    }

    if let Some(html) = html {
        let lower = html.to_lowercase();
        if PAGE_MARKERS.iter().any(|m| lower.contains(m)) {
            return true;
        }
        // Heavy paywall markup often includes these terms.
        if paywall_markup_re().is_match(&lower) {
            return true;
        }
    }

    false
}
