use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    Idle,
    Active,
    Ended,
}

impl Default for SessionStatus {
    fn default() -> Self {
        SessionStatus::Idle
    }
}

/// The single task session tracked by the process. Totals stay readable after
/// the session ends and are reset by the next start.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: Option<String>,
    pub status: SessionStatus,
    pub task: String,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub productive_ms: u64,
    pub unproductive_ms: u64,
}

impl Session {
    pub fn begin(id: String, task: String, started_at: DateTime<Utc>) -> Self {
        Self {
            id: Some(id),
            status: SessionStatus::Active,
            task,
            started_at: Some(started_at),
            ended_at: None,
            productive_ms: 0,
            unproductive_ms: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    /// Wall-clock length of the session, measured up to `now` while it is still running.
    pub fn wall_ms(&self, now: DateTime<Utc>) -> u64 {
        let Some(started_at) = self.started_at else {
            return 0;
        };
        let until = self.ended_at.unwrap_or(now);
        (until - started_at).num_milliseconds().max(0) as u64
    }
}
