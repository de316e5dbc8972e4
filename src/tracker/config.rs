use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for the session/site tracker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrackerSettings {
    /// Period of the time flush while a session is active
    pub tick_interval_secs: u64,

    /// Delay before an unproductive verdict raises an alert
    pub unproductive_alert_secs: u64,

    /// URLs starting with any of these are browser-internal and never tracked
    pub excluded_prefixes: Vec<String>,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            tick_interval_secs: 30,
            unproductive_alert_secs: 120,
            excluded_prefixes: vec![
                "chrome://".into(),
                "chrome-extension://".into(),
                "about:".into(),
                "edge://".into(),
                "moz-extension://".into(),
            ],
        }
    }
}

impl TrackerSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs.max(1))
    }

    pub fn unproductive_alert_delay(&self) -> Duration {
        Duration::from_secs(self.unproductive_alert_secs)
    }

    pub fn is_trackable(&self, url: &str) -> bool {
        !url.is_empty()
            && !self
                .excluded_prefixes
                .iter()
                .any(|prefix| url.starts_with(prefix.as_str()))
    }

    /// Human wording of the alert delay, e.g. "2 minutes".
    pub fn alert_delay_label(&self) -> String {
        let secs = self.unproductive_alert_secs;
        if secs >= 60 && secs % 60 == 0 {
            let minutes = secs / 60;
            if minutes == 1 {
                "1 minute".to_string()
            } else {
                format!("{minutes} minutes")
            }
        } else if secs == 1 {
            "1 second".to_string()
        } else {
            format!("{secs} seconds")
        }
    }
}
