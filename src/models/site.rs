//! Site-level data models.
//!
//! `SiteVisit` is the page currently in focus; `VisitedSiteRecord` aggregates
//! time per hostname for the whole session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

pub const PENDING_EXPLANATION: &str = "Initial classification, waiting for content analysis...";
pub const OVERRIDE_EXPLANATION: &str = "Classification manually overridden by you";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SiteVisit {
    pub url: String,
    pub hostname: String,
    pub title: String,
    pub is_productive: bool,
    pub explanation: String,
    pub classification_pending: bool,
    pub initial_classification_done: bool,
    pub classification_started_at: Option<DateTime<Utc>>,
    /// Duration of the last full classification round trip.
    pub classification_ms: Option<u64>,
}

impl SiteVisit {
    /// Fresh visit: fail-open as productive until a verdict arrives.
    pub fn new(url: &str, title: &str) -> Self {
        Self {
            url: url.to_string(),
            hostname: hostname_of(url),
            title: title.to_string(),
            is_productive: true,
            explanation: PENDING_EXPLANATION.to_string(),
            classification_pending: true,
            initial_classification_done: false,
            classification_started_at: None,
            classification_ms: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VisitedSiteRecord {
    pub title: String,
    pub url: String,
    pub total_time_ms: u64,
    pub is_productive: bool,
}

impl VisitedSiteRecord {
    pub fn first_visit(site: &SiteVisit) -> Self {
        Self {
            title: site.title.clone(),
            url: site.url.clone(),
            total_time_ms: 0,
            is_productive: site.is_productive,
        }
    }
}

/// Hostname used as the sharding key for time accounting and feedback.
/// Unparseable URLs fall back to the raw string.
pub fn hostname_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hostname_of_extracts_host() {
        assert_eq!(hostname_of("https://en.wikipedia.org/wiki/Rust"), "en.wikipedia.org");
        assert_eq!(hostname_of("http://localhost:8080/a?b=c"), "localhost");
    }

    #[test]
    fn hostname_of_falls_back_to_raw_input() {
        assert_eq!(hostname_of("not a url"), "not a url");
        assert_eq!(hostname_of(""), "");
    }

    #[test]
    fn new_visit_defaults_to_productive_and_pending() {
        let visit = SiteVisit::new("https://example.com/page", "Example");
        assert!(visit.is_productive);
        assert!(visit.classification_pending);
        assert!(!visit.initial_classification_done);
        assert_eq!(visit.hostname, "example.com");
        assert_eq!(visit.explanation, PENDING_EXPLANATION);
    }
}
