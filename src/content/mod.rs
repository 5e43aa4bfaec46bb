mod extract;
mod page;
mod paywall;

pub use page::ContentFetcher;
pub use paywall::{is_probably_paid_substack, is_substack_url};
