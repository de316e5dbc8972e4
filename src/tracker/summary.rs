use chrono::{DateTime, Utc};
use serde::Serialize;

use super::state::TrackerState;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SiteSummary {
    pub hostname: String,
    pub title: String,
    pub url: String,
    pub total_time_ms: u64,
    pub formatted_time: String,
    pub is_productive: bool,
}

/// End-of-session report. Percentages are of wall-clock session time.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: Option<String>,
    pub task: String,
    pub active: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub total_ms: u64,
    pub productive_ms: u64,
    pub unproductive_ms: u64,
    pub productive_percent: u32,
    pub unproductive_percent: u32,
    /// Longest first.
    pub sites: Vec<SiteSummary>,
}

pub fn summarize(state: &TrackerState, now: DateTime<Utc>) -> SessionSummary {
    let session = &state.session;
    let total_ms = session.wall_ms(now);

    let mut sites: Vec<SiteSummary> = state
        .visited_sites
        .iter()
        .map(|(hostname, record)| SiteSummary {
            hostname: hostname.clone(),
            title: if record.title.is_empty() {
                hostname.clone()
            } else {
                record.title.clone()
            },
            url: record.url.clone(),
            total_time_ms: record.total_time_ms,
            formatted_time: format_duration(record.total_time_ms),
            is_productive: record.is_productive,
        })
        .collect();
    sites.sort_by(|a, b| {
        b.total_time_ms
            .cmp(&a.total_time_ms)
            .then_with(|| a.hostname.cmp(&b.hostname))
    });

    SessionSummary {
        session_id: session.id.clone(),
        task: session.task.clone(),
        active: session.is_active(),
        started_at: session.started_at,
        ended_at: session.ended_at,
        total_ms,
        productive_ms: session.productive_ms,
        unproductive_ms: session.unproductive_ms,
        productive_percent: percent(session.productive_ms, total_ms),
        unproductive_percent: percent(session.unproductive_ms, total_ms),
        sites,
    }
}

fn percent(part: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    ((part as f64 / total as f64) * 100.0).round() as u32
}

/// Formats milliseconds as `H:MM:SS`.
pub fn format_duration(ms: u64) -> String {
    let seconds = ms / 1000;
    let minutes = seconds / 60;
    let hours = minutes / 60;
    format!("{}:{:02}:{:02}", hours, minutes % 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Session, VisitedSiteRecord};
    use chrono::Duration;

    fn record(title: &str, total_time_ms: u64, is_productive: bool) -> VisitedSiteRecord {
        VisitedSiteRecord {
            title: title.into(),
            url: String::new(),
            total_time_ms,
            is_productive,
        }
    }

    #[test]
    fn formats_hours_minutes_seconds() {
        assert_eq!(format_duration(0), "0:00:00");
        assert_eq!(format_duration(59_999), "0:00:59");
        assert_eq!(format_duration(61_000), "0:01:01");
        assert_eq!(format_duration(3_600_000 * 12 + 5_000), "12:00:05");
    }

    #[test]
    fn summary_sorts_sites_and_computes_percentages() {
        let t0 = Utc::now();
        let mut state = TrackerState::new();
        state.session = Session::begin("s".into(), "write blog post".into(), t0);
        state.session.productive_ms = 60_000;
        state.session.unproductive_ms = 30_000;
        state
            .visited_sites
            .insert("docs.example".into(), record("Docs", 60_000, true));
        state
            .visited_sites
            .insert("video.example".into(), record("", 30_000, false));

        let summary = summarize(&state, t0 + Duration::seconds(120));
        assert_eq!(summary.total_ms, 120_000);
        assert_eq!(summary.productive_percent, 50);
        assert_eq!(summary.unproductive_percent, 25);
        assert_eq!(summary.sites[0].hostname, "docs.example");
        assert_eq!(summary.sites[1].title, "video.example");
        assert_eq!(summary.sites[1].formatted_time, "0:00:30");
    }

    #[test]
    fn empty_session_has_zero_percentages() {
        let summary = summarize(&TrackerState::new(), Utc::now());
        assert_eq!(summary.total_ms, 0);
        assert_eq!(summary.productive_percent, 0);
        assert!(summary.sites.is_empty());
    }
}
