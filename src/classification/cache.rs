use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::classification::config::ClassificationConfig;
use crate::storage::{get_or_default, keys, set_one, Storage};

/// Raw service answer for one (url, task) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub url: String,
    pub task: String,
    pub raw_verdict: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

type CacheMap = BTreeMap<String, CacheEntry>;

/// Memoizes service answers keyed by the literal (url, task) pair, persisted
/// in the key-value store. Bounded: once an insert would exceed capacity the
/// oldest entries by timestamp are dropped in one batch. Clones share the
/// write lock, so concurrent puts never drop each other's entries.
#[derive(Clone)]
pub struct ClassificationCache {
    storage: Arc<dyn Storage>,
    write_lock: Arc<Mutex<()>>,
    capacity: usize,
    eviction_batch: usize,
}

impl ClassificationCache {
    pub fn new(storage: Arc<dyn Storage>, config: &ClassificationConfig) -> Self {
        Self {
            storage,
            write_lock: Arc::new(Mutex::new(())),
            capacity: config.cache_capacity.max(1),
            eviction_batch: config.cache_eviction_batch,
        }
    }

    pub async fn get(&self, url: &str, task: &str) -> Result<Option<String>> {
        let entries = self.load().await?;
        Ok(entries
            .get(&cache_key(url, task))
            .filter(|entry| entry.url == url && entry.task == task)
            .map(|entry| entry.raw_verdict.clone()))
    }

    pub async fn put(&self, url: &str, task: &str, raw_verdict: &str) -> Result<()> {
        self.put_at(url, task, raw_verdict, Utc::now()).await
    }

    pub async fn put_at(
        &self,
        url: &str,
        task: &str,
        raw_verdict: &str,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await?;
        let key = cache_key(url, task);

        if !entries.contains_key(&key) && entries.len() + 1 > self.capacity {
            let overflow = entries.len() + 1 - self.capacity;
            evict_oldest(&mut entries, self.eviction_batch.max(overflow));
        }

        entries.insert(
            key,
            CacheEntry {
                url: url.to_string(),
                task: task.to_string(),
                raw_verdict: raw_verdict.to_string(),
                timestamp: at.timestamp_millis(),
            },
        );

        let value =
            serde_json::to_value(&entries).context("failed to encode classification cache")?;
        set_one(self.storage.as_ref(), keys::CLASSIFICATION_CACHE, value)
            .await
            .context("failed to store classification cache")
    }

    pub async fn len(&self) -> Result<usize> {
        Ok(self.load().await?.len())
    }

    async fn load(&self) -> Result<CacheMap> {
        get_or_default(self.storage.as_ref(), keys::CLASSIFICATION_CACHE)
            .await
            .context("failed to load classification cache")
    }
}

/// Length-prefixed so that no two (url, task) pairs share a key.
fn cache_key(url: &str, task: &str) -> String {
    format!("{}:{url}_{task}", url.len())
}

fn evict_oldest(entries: &mut CacheMap, count: usize) {
    let mut by_age: Vec<(i64, String)> = entries
        .iter()
        .map(|(key, entry)| (entry.timestamp, key.clone()))
        .collect();
    by_age.sort();

    for (_, key) in by_age.into_iter().take(count) {
        entries.remove(&key);
    }
}
