use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A subscribed feed as stored in the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feed {
    pub id: i64,
    pub url: String,
    pub paused: bool,
    pub created_at: DateTime<Utc>,
}
