mod fetcher;
mod selector;

pub use fetcher::FeedFetcher;
pub use selector::{select_batch, MAX_BATCH};
