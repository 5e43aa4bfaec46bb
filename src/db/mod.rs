mod registry;
mod schema;

pub use registry::FeedRegistry;
