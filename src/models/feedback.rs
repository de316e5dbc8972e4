use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A manual override recorded by the user, keyed by URL in the feedback log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRecord {
    pub task: String,
    pub is_productive: bool,
    pub timestamp: DateTime<Utc>,
}
