//! User corrections, keyed by URL, used to bias later scores for the same
//! hostname under a similar task.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use crate::classification::config::ClassificationConfig;
use crate::classification::terms::{extract_terms, overlap};
use crate::models::{hostname_of, FeedbackRecord};
use crate::storage::{get_or_default, keys, set_one, Storage};

/// Ordered so that scoring over it is deterministic.
pub type FeedbackLog = BTreeMap<String, FeedbackRecord>;

#[derive(Clone)]
pub struct FeedbackStore {
    storage: Arc<dyn Storage>,
    write_lock: Arc<Mutex<()>>,
}

impl FeedbackStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn load(&self) -> Result<FeedbackLog> {
        get_or_default(self.storage.as_ref(), keys::CLASSIFICATION_FEEDBACK)
            .await
            .context("failed to load classification feedback")
    }

    /// Read-modify-write of the whole log; the latest correction for a URL wins.
    pub async fn record(&self, url: &str, record: FeedbackRecord) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut log = self.load().await?;
        log.insert(url.to_string(), record);
        let value = serde_json::to_value(&log).context("failed to encode feedback log")?;
        set_one(self.storage.as_ref(), keys::CLASSIFICATION_FEEDBACK, value)
            .await
            .context("failed to store classification feedback")
    }
}

/// Score bias from stored corrections for `url` under the task whose terms are
/// `task_terms`. A correction counts when it is for the same hostname, its task
/// overlaps the current one by more than the configured minimum, and it is
/// younger than the feedback window. The last qualifying entry wins.
pub fn feedback_adjustment(
    url: &str,
    task_terms: &[String],
    log: &FeedbackLog,
    config: &ClassificationConfig,
    now: DateTime<Utc>,
) -> f64 {
    let hostname = hostname_of(url);
    let window = Duration::days(config.feedback_window_days);
    let mut adjustment = 0.0;

    for (feedback_url, record) in log {
        if hostname_of(feedback_url) != hostname {
            continue;
        }
        if overlap(&extract_terms(&record.task), task_terms) <= config.feedback_task_overlap {
            continue;
        }
        if now - record.timestamp >= window {
            continue;
        }
        adjustment = if record.is_productive {
            config.feedback_adjustment
        } else {
            -config.feedback_adjustment
        };
    }

    adjustment
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn record(task: &str, is_productive: bool, timestamp: DateTime<Utc>) -> FeedbackRecord {
        FeedbackRecord {
            task: task.to_string(),
            is_productive,
            timestamp,
        }
    }

    #[test]
    fn matching_recent_feedback_biases_score() {
        let now = Utc::now();
        let config = ClassificationConfig::default();
        let task_terms = extract_terms("write blog post");
        let mut log = FeedbackLog::new();
        log.insert(
            "https://www.youtube.com/watch?v=abc".into(),
            record("write blog post", true, now - Duration::days(1)),
        );

        let adjustment = feedback_adjustment(
            "https://www.youtube.com/watch?v=other",
            &task_terms,
            &log,
            &config,
            now,
        );
        assert!((adjustment - 0.2).abs() < 1e-9);
    }

    #[test]
    fn negative_feedback_lowers_score() {
        let now = Utc::now();
        let config = ClassificationConfig::default();
        let task_terms = extract_terms("write blog post");
        let mut log = FeedbackLog::new();
        log.insert(
            "https://news.example.com/a".into(),
            record("write blog post", false, now),
        );

        let adjustment =
            feedback_adjustment("https://news.example.com/b", &task_terms, &log, &config, now);
        assert!((adjustment + 0.2).abs() < 1e-9);
    }

    #[test]
    fn feedback_outside_window_or_other_host_or_task_is_ignored() {
        let now = Utc::now();
        let config = ClassificationConfig::default();
        let task_terms = extract_terms("write blog post");
        let mut log = FeedbackLog::new();
        log.insert(
            "https://old.example.com/".into(),
            record("write blog post", true, now - Duration::days(8)),
        );
        log.insert(
            "https://other.example.com/".into(),
            record("write blog post", true, now),
        );
        log.insert(
            "https://task.example.com/".into(),
            record("plan holiday trip", true, now),
        );

        for url in [
            "https://old.example.com/x",
            "https://unrelated.example.com/",
            "https://task.example.com/x",
        ] {
            assert_eq!(
                feedback_adjustment(url, &task_terms, &log, &config, now),
                0.0,
                "{url}"
            );
        }
    }

    #[tokio::test]
    async fn record_then_load_round_trips_through_storage() {
        let storage = Arc::new(MemoryStorage::new());
        let store = FeedbackStore::new(storage.clone());
        let now = Utc::now();

        store
            .record("https://example.com/a", record("task one", true, now))
            .await
            .unwrap();
        store
            .record("https://example.com/a", record("task one", false, now))
            .await
            .unwrap();
        store
            .record("https://example.com/b", record("task two", true, now))
            .await
            .unwrap();

        let log = store.load().await.unwrap();
        assert_eq!(log.len(), 2);
        assert!(!log["https://example.com/a"].is_productive);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_records_are_all_kept() {
        let store = FeedbackStore::new(Arc::new(MemoryStorage::new()));
        let now = Utc::now();

        let writes: Vec<_> = (0..10)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .record(
                            &format!("https://example.com/{i}"),
                            record("write blog post", i % 2 == 0, now),
                        )
                        .await
                })
            })
            .collect();
        for write in writes {
            write.await.unwrap().unwrap();
        }

        assert_eq!(store.load().await.unwrap().len(), 10);
    }
}
