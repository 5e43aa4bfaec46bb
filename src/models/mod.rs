mod entry;
mod feed;

pub use entry::{FetchedFeed, RawFeedEntry};
pub use feed::Feed;
