use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use log::warn;
use rusqlite::{params, params_from_iter};
use serde_json::Value;

use crate::db::Database;
use crate::storage::Storage;

impl Database {
    pub async fn get_values(&self, keys: Vec<String>) -> Result<HashMap<String, Value>> {
        if keys.is_empty() {
            return Ok(HashMap::new());
        }

        self.execute(move |conn| {
            let placeholders = vec!["?"; keys.len()].join(", ");
            let sql = format!("SELECT key, value FROM kv_store WHERE key IN ({placeholders})");
            let mut stmt = conn.prepare(&sql)?;

            let rows = stmt
                .query_map(params_from_iter(keys.iter()), |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })?
                .collect::<Result<Vec<_>, _>>()?;

            let mut values = HashMap::with_capacity(rows.len());
            for (key, raw) in rows {
                match serde_json::from_str(&raw) {
                    Ok(value) => {
                        values.insert(key, value);
                    }
                    Err(err) => warn!("Skipping undecodable stored value for {key}: {err}"),
                }
            }
            Ok(values)
        })
        .await
    }

    pub async fn set_values(&self, values: HashMap<String, Value>) -> Result<()> {
        if values.is_empty() {
            return Ok(());
        }

        self.execute(move |conn| {
            let updated_at = Utc::now().to_rfc3339();
            let tx = conn.transaction()?;
            for (key, value) in &values {
                let raw = serde_json::to_string(value)
                    .with_context(|| format!("failed to encode value for {key}"))?;
                tx.execute(
                    "INSERT INTO kv_store (key, value, updated_at)
                     VALUES (?1, ?2, ?3)
                     ON CONFLICT(key) DO UPDATE SET
                         value = excluded.value,
                         updated_at = excluded.updated_at",
                    params![key, raw, updated_at],
                )
                .with_context(|| format!("failed to store {key}"))?;
            }
            tx.commit().context("failed to commit key-value update")?;
            Ok(())
        })
        .await
    }

}

#[async_trait]
impl Storage for Database {
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>> {
        self.get_values(keys.iter().map(|key| key.to_string()).collect())
            .await
    }

    async fn set(&self, values: HashMap<String, Value>) -> Result<()> {
        self.set_values(values).await
    }
}
