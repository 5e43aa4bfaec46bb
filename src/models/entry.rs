/// One normalized feed entry, produced at the fetch boundary.
///
/// `uid` is the first non-empty of the provider-given id, the link, or the
/// title. Entries whose uid would be empty are dropped before they reach
/// the selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFeedEntry {
    pub uid: String,
    pub title: String,
    pub link: String,
}

/// Result of fetching one feed URL.
///
/// `malformed` covers both transport failures and parse failures; whatever
/// entries survived are still usable. Entries are newest-first. `title` is
/// the feed-level title when the document carries one.
#[derive(Debug, Default)]
pub struct FetchedFeed {
    pub malformed: bool,
    pub title: Option<String>,
    pub entries: Vec<RawFeedEntry>,
}
