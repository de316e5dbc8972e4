use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for relevance scoring, the classification cache and the remote call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClassificationConfig {
    /// Adjusted score must exceed this to be productive
    pub productive_threshold: f64,

    /// Magnitude of the bias applied by a matching user correction
    pub feedback_adjustment: f64,
    pub feedback_window_days: i64,
    /// Task overlap a stored correction needs to count as "similar task"
    pub feedback_task_overlap: f64,

    /// Relevance component weights
    pub weight_title: f64,
    pub weight_content: f64,
    pub weight_search: f64,
    pub weight_metadata: f64,

    /// Characters of page text the heuristic looks at
    pub heuristic_content_chars: usize,
    /// Characters of page text embedded in the service prompt
    pub prompt_content_chars: usize,

    pub cache_capacity: usize,
    pub cache_eviction_batch: usize,

    pub service_timeout_secs: u64,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            productive_threshold: 0.15,
            feedback_adjustment: 0.2,
            feedback_window_days: 7,
            feedback_task_overlap: 0.5,
            weight_title: 2.0,
            weight_content: 0.8,
            weight_search: 1.5,
            weight_metadata: 0.4,
            heuristic_content_chars: 3000,
            prompt_content_chars: 2000,
            cache_capacity: 100,
            cache_eviction_batch: 20,
            service_timeout_secs: 10,
        }
    }
}

impl ClassificationConfig {
    pub fn service_timeout(&self) -> Duration {
        Duration::from_secs(self.service_timeout_secs)
    }
}
