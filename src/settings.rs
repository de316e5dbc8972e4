use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::classification::{ClassificationConfig, ServiceConfig};
use crate::tracker::TrackerSettings;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UserSettings {
    pub classification: ClassificationConfig,
    pub service: ServiceConfig,
    pub tracker: TrackerSettings,
}

/// `settings.json` in the data directory. A missing file is created with the
/// defaults; an unreadable one yields defaults and is left untouched.
pub struct SettingsStore {
    path: PathBuf,
    data: UserSettings,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            let store = Self {
                path,
                data: UserSettings::default(),
            };
            store.persist()?;
            return Ok(store);
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        let data = serde_json::from_str(&contents).unwrap_or_default();
        Ok(Self { path, data })
    }

    pub fn current(&self) -> UserSettings {
        self.data.clone()
    }

    fn persist(&self) -> Result<()> {
        let serialized = serde_json::to_string_pretty(&self.data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
