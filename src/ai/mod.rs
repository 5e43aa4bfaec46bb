mod summarizer;

pub use summarizer::{Provider, Summarizer, SummaryConfig};
