use std::collections::HashSet;

use crate::models::RawFeedEntry;

/// Per-feed, per-tick ceiling on processed entries. A backlogged feed drains
/// at this rate across consecutive ticks.
pub const MAX_BATCH: usize = 10;

/// Picks the batch of entries to process for one feed.
///
/// Precondition: `entries` is newest-first, as feeds deliver them (the
/// fetcher re-sorts by published date when it can). The batch is the
/// `MAX_BATCH` newest unseen entries, reversed to oldest-first so partial
/// progress delivers the most overdue entries before newer ones. Entries
/// beyond the cap stay unseen and are reconsidered next tick.
pub fn select_batch(entries: &[RawFeedEntry], seen: &HashSet<String>) -> Vec<RawFeedEntry> {
    let mut batch: Vec<RawFeedEntry> = entries
        .iter()
        .filter(|e| !e.uid.is_empty())
        .filter(|e| !seen.contains(&e.uid))
        .take(MAX_BATCH)
        .cloned()
        .collect();
    batch.reverse();
    batch
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(i: usize) -> RawFeedEntry {
        RawFeedEntry {
            uid: format!("uid-{i}"),
            title: format!("Article {i}"),
            link: format!("https://example.com/p/{i}"),
        }
    }

    #[test]
    fn caps_at_ten_newest_and_reverses_to_oldest_first() {
        // index 0 is newest, 19 oldest
        let entries: Vec<_> = (0..20).map(entry).collect();
        let batch = select_batch(&entries, &HashSet::new());

        let uids: Vec<_> = batch.iter().map(|e| e.uid.as_str()).collect();
        let expected: Vec<String> = (0..10).rev().map(|i| format!("uid-{i}")).collect();
        assert_eq!(uids, expected.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn small_feed_is_processed_in_full_oldest_first() {
        let entries: Vec<_> = (0..5).map(entry).collect();
        let batch = select_batch(&entries, &HashSet::new());

        let uids: Vec<_> = batch.iter().map(|e| e.uid.as_str()).collect();
        assert_eq!(uids, vec!["uid-4", "uid-3", "uid-2", "uid-1", "uid-0"]);
    }

    #[test]
    fn seen_entries_are_excluded() {
        let entries: Vec<_> = (0..5).map(entry).collect();
        let seen: HashSet<String> = ["uid-1", "uid-3"].iter().map(|s| s.to_string()).collect();
        let batch = select_batch(&entries, &seen);

        let uids: Vec<_> = batch.iter().map(|e| e.uid.as_str()).collect();
        assert_eq!(uids, vec!["uid-4", "uid-2", "uid-0"]);
    }

    #[test]
    fn empty_uid_entries_are_dropped() {
        let mut entries: Vec<_> = (0..3).map(entry).collect();
        entries[1].uid = String::new();
        let batch = select_batch(&entries, &HashSet::new());

        let uids: Vec<_> = batch.iter().map(|e| e.uid.as_str()).collect();
        assert_eq!(uids, vec!["uid-2", "uid-0"]);
    }

    #[test]
    fn seen_filter_applies_before_the_cap() {
        // 15 entries, the 5 newest already seen: the batch should be the
        // next 10, not 5.
        let entries: Vec<_> = (0..15).map(entry).collect();
        let seen: HashSet<String> = (0..5).map(|i| format!("uid-{i}")).collect();
        let batch = select_batch(&entries, &seen);

        assert_eq!(batch.len(), 10);
        assert_eq!(batch.first().unwrap().uid, "uid-14");
        assert_eq!(batch.last().unwrap().uid, "uid-5");
    }
}
