use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use super::Storage;

/// In-process store. Clones share the same map.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<HashMap<String, Value>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>> {
        let guard = self.inner.lock().await;
        Ok(keys
            .iter()
            .filter_map(|key| guard.get(*key).map(|value| (key.to_string(), value.clone())))
            .collect())
    }

    async fn set(&self, values: HashMap<String, Value>) -> Result<()> {
        let mut guard = self.inner.lock().await;
        guard.extend(values);
        Ok(())
    }
}
