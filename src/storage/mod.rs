pub mod keys;
mod memory;

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use memory::MemoryStorage;

/// Durable asynchronous key-value store. Each call is atomic on its own;
/// nothing spans calls.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Returns the stored values for `keys`; absent keys are omitted.
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>>;

    async fn set(&self, values: HashMap<String, Value>) -> Result<()>;
}

/// Reads a single key and decodes it, treating absent or undecodable values
/// as the type's default.
pub async fn get_or_default<T>(storage: &dyn Storage, key: &str) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let mut values = storage.get(&[key]).await?;
    Ok(values
        .remove(key)
        .and_then(|value| serde_json::from_value(value).ok())
        .unwrap_or_default())
}

pub async fn set_one(storage: &dyn Storage, key: &str, value: Value) -> Result<()> {
    let mut values = HashMap::with_capacity(1);
    values.insert(key.to_string(), value);
    storage.set(values).await
}
