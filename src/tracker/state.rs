//! Session/site state and its transition function.
//!
//! `TrackerState::apply` is pure: it takes an event and the current time,
//! mutates the state and returns the side effects the controller must carry
//! out. All I/O (storage, scraping, classification, timers) lives in the
//! controller.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::models::site::OVERRIDE_EXPLANATION;
use crate::models::{
    ClassificationRequest, FeedbackRecord, PageContent, Session, SessionStatus, SiteVisit, Verdict,
    VisitedSiteRecord,
};
use crate::storage::keys;

use super::config::TrackerSettings;

pub const QUICK_EXPLANATION_PREFIX: &str = "Initial classification based on title: ";

/// Page focused in the browser when a session starts.
#[derive(Debug, Clone, PartialEq)]
pub struct FocusedPage {
    pub url: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Start {
        task: String,
        session_id: String,
        focused: Option<FocusedPage>,
    },
    End,
    Navigate {
        url: String,
        title: String,
    },
    /// Page content for `url`; `None` when the scraper failed.
    ContentArrived {
        url: String,
        content: Option<PageContent>,
    },
    QuickVerdict {
        visit: u64,
        url: String,
        verdict: Verdict,
    },
    FullVerdict {
        visit: u64,
        url: String,
        verdict: Verdict,
        elapsed_ms: u64,
    },
    Tick,
    Toggle,
    AlertDue {
        visit: u64,
        url: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    SessionStarted,
    Persist,
    NotifySiteUpdated,
    FetchContent {
        url: String,
        title: String,
    },
    Classify {
        visit: u64,
        quick: Option<ClassificationRequest>,
        full: ClassificationRequest,
    },
    ScheduleAlert {
        visit: u64,
        url: String,
    },
    RaiseAlert {
        hostname: String,
        task: String,
    },
    RecordFeedback {
        url: String,
        record: FeedbackRecord,
    },
    SessionEnded,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Accepted,
    /// Event had no effect: no session, excluded URL, stale completion.
    Ignored,
    Rejected(String),
    Toggled(bool),
    NoCurrentSite,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub reply: Reply,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn accepted(effects: Vec<Effect>) -> Self {
        Self {
            reply: Reply::Accepted,
            effects,
        }
    }

    fn ignored() -> Self {
        Self {
            reply: Reply::Ignored,
            effects: Vec::new(),
        }
    }

    fn reply(reply: Reply) -> Self {
        Self {
            reply,
            effects: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TrackerState {
    pub session: Session,
    pub current_site: Option<SiteVisit>,
    /// Keyed by hostname.
    pub visited_sites: HashMap<String, VisitedSiteRecord>,
    /// Reference point of the next time flush for the current site.
    site_anchor: Option<DateTime<Utc>>,
    /// Identity of the current visit; bumped on every navigation.
    visit: u64,
}

impl TrackerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_visit(&self) -> u64 {
        self.visit
    }

    pub fn apply(
        &mut self,
        event: Event,
        now: DateTime<Utc>,
        settings: &TrackerSettings,
    ) -> Transition {
        match event {
            Event::Start {
                task,
                session_id,
                focused,
            } => self.start(task, session_id, focused, now, settings),
            Event::End => self.end(now),
            Event::Navigate { url, title } => self.navigate(url, title, now, settings),
            Event::ContentArrived { url, content } => self.content_arrived(&url, content, now),
            Event::QuickVerdict {
                visit,
                url,
                verdict,
            } => self.quick_verdict(visit, &url, verdict),
            Event::FullVerdict {
                visit,
                url,
                verdict,
                elapsed_ms,
            } => self.full_verdict(visit, &url, verdict, elapsed_ms),
            Event::Tick => self.tick(now),
            Event::Toggle => self.toggle(now),
            Event::AlertDue { visit, url } => self.alert_due(visit, &url),
        }
    }

    /// Attributes the time since the last flush to the current site and to the
    /// session bucket matching its current flag, then moves the reference
    /// point to `now`. Returns the flushed milliseconds.
    pub fn flush(&mut self, now: DateTime<Utc>) -> u64 {
        if !self.session.is_active() {
            return 0;
        }
        let (Some(site), Some(anchor)) = (self.current_site.as_ref(), self.site_anchor) else {
            return 0;
        };

        let elapsed = (now - anchor).num_milliseconds().max(0) as u64;
        self.site_anchor = Some(now);

        self.visited_sites
            .entry(site.hostname.clone())
            .or_insert_with(|| VisitedSiteRecord::first_visit(site))
            .total_time_ms += elapsed;

        if site.is_productive {
            self.session.productive_ms += elapsed;
        } else {
            self.session.unproductive_ms += elapsed;
        }

        elapsed
    }

    fn start(
        &mut self,
        task: String,
        session_id: String,
        focused: Option<FocusedPage>,
        now: DateTime<Utc>,
        settings: &TrackerSettings,
    ) -> Transition {
        let task = task.trim().to_string();
        if task.is_empty() {
            return Transition::reply(Reply::Rejected("task must not be empty".into()));
        }

        self.session = Session::begin(session_id, task, now);
        self.current_site = None;
        self.site_anchor = None;
        self.visited_sites.clear();

        let mut effects = vec![Effect::SessionStarted];
        match focused {
            Some(page) if settings.is_trackable(&page.url) => {
                effects.extend(self.enter_site(page.url, page.title, now));
            }
            _ => effects.extend([Effect::Persist, Effect::NotifySiteUpdated]),
        }

        Transition::accepted(effects)
    }

    fn end(&mut self, now: DateTime<Utc>) -> Transition {
        if !self.session.is_active() {
            return Transition::ignored();
        }

        self.flush(now);
        self.session.status = SessionStatus::Ended;
        self.session.ended_at = Some(now);
        self.current_site = None;
        self.site_anchor = None;

        Transition::accepted(vec![
            Effect::Persist,
            Effect::NotifySiteUpdated,
            Effect::SessionEnded,
        ])
    }

    fn navigate(
        &mut self,
        url: String,
        title: String,
        now: DateTime<Utc>,
        settings: &TrackerSettings,
    ) -> Transition {
        if !self.session.is_active() || !settings.is_trackable(&url) {
            return Transition::ignored();
        }

        self.flush(now);
        Transition::accepted(self.enter_site(url, title, now))
    }

    fn enter_site(&mut self, url: String, title: String, now: DateTime<Utc>) -> Vec<Effect> {
        let site = SiteVisit::new(&url, &title);
        self.visited_sites
            .entry(site.hostname.clone())
            .or_insert_with(|| VisitedSiteRecord::first_visit(&site));

        self.visit += 1;
        self.current_site = Some(site);
        self.site_anchor = Some(now);

        vec![
            Effect::Persist,
            Effect::NotifySiteUpdated,
            Effect::FetchContent { url, title },
        ]
    }

    fn content_arrived(
        &mut self,
        url: &str,
        content: Option<PageContent>,
        now: DateTime<Utc>,
    ) -> Transition {
        let task = self.session.task.clone();
        let visit = self.visit;
        let Some(site) = self.active_site_for(url) else {
            return Transition::ignored();
        };

        if site.title.is_empty() {
            if let Some(content) = content.as_ref().filter(|c| !c.title.is_empty()) {
                site.title = content.title.clone();
            }
        }

        let (text, metadata) = match content {
            Some(content) => (content.full_text, Some(content.metadata)),
            None => (String::new(), None),
        };
        let full = ClassificationRequest {
            url: site.url.clone(),
            title: site.title.clone(),
            task,
            content: text,
            metadata,
        };

        let quick = if site.initial_classification_done {
            None
        } else {
            site.initial_classification_done = true;
            Some(full.title_only())
        };
        site.classification_pending = true;
        site.classification_started_at = Some(now);

        Transition::accepted(vec![Effect::Classify { visit, quick, full }])
    }

    fn quick_verdict(&mut self, visit: u64, url: &str, verdict: Verdict) -> Transition {
        let Some(site) = self.site_for_visit(visit, url) else {
            return Transition::ignored();
        };
        // A settled full verdict outranks the title-only guess.
        if !site.classification_pending {
            return Transition::ignored();
        }

        site.is_productive = verdict.is_productive;
        site.explanation = format!("{QUICK_EXPLANATION_PREFIX}{}", verdict.explanation);
        self.sync_visited_flag();

        Transition::accepted(vec![Effect::Persist, Effect::NotifySiteUpdated])
    }

    fn full_verdict(
        &mut self,
        visit: u64,
        url: &str,
        verdict: Verdict,
        elapsed_ms: u64,
    ) -> Transition {
        let Some(site) = self.site_for_visit(visit, url) else {
            return Transition::ignored();
        };

        site.is_productive = verdict.is_productive;
        site.explanation = verdict.explanation;
        site.classification_pending = false;
        site.classification_ms = Some(elapsed_ms);
        let url = site.url.clone();
        let is_productive = site.is_productive;
        self.sync_visited_flag();

        let mut effects = vec![Effect::Persist, Effect::NotifySiteUpdated];
        if !is_productive {
            effects.push(Effect::ScheduleAlert { visit, url });
        }
        Transition::accepted(effects)
    }

    fn tick(&mut self, now: DateTime<Utc>) -> Transition {
        if !self.session.is_active() || self.current_site.is_none() {
            return Transition::ignored();
        }
        self.flush(now);
        Transition::accepted(vec![Effect::Persist])
    }

    fn toggle(&mut self, now: DateTime<Utc>) -> Transition {
        if !self.session.is_active() {
            return Transition::reply(Reply::NoCurrentSite);
        }
        let task = self.session.task.clone();
        let Some(site) = self.current_site.as_mut() else {
            return Transition::reply(Reply::NoCurrentSite);
        };

        site.is_productive = !site.is_productive;
        site.explanation = OVERRIDE_EXPLANATION.to_string();
        let is_productive = site.is_productive;
        let record = FeedbackRecord {
            task,
            is_productive,
            timestamp: now,
        };
        let url = site.url.clone();
        self.sync_visited_flag();

        Transition {
            reply: Reply::Toggled(is_productive),
            effects: vec![
                Effect::RecordFeedback { url, record },
                Effect::Persist,
                Effect::NotifySiteUpdated,
            ],
        }
    }

    fn alert_due(&mut self, visit: u64, url: &str) -> Transition {
        let task = self.session.task.clone();
        let Some(site) = self.site_for_visit(visit, url) else {
            return Transition::ignored();
        };
        if site.is_productive || site.classification_pending {
            return Transition::ignored();
        }

        Transition::accepted(vec![Effect::RaiseAlert {
            hostname: site.hostname.clone(),
            task,
        }])
    }

    fn active_site_for(&mut self, url: &str) -> Option<&mut SiteVisit> {
        if !self.session.is_active() {
            return None;
        }
        self.current_site.as_mut().filter(|site| site.url == url)
    }

    /// Current site if it is still the visit an async completion was issued for.
    fn site_for_visit(&mut self, visit: u64, url: &str) -> Option<&mut SiteVisit> {
        if visit != self.visit {
            return None;
        }
        self.active_site_for(url)
    }

    fn sync_visited_flag(&mut self) {
        if let Some(site) = self.current_site.as_ref() {
            if let Some(record) = self.visited_sites.get_mut(&site.hostname) {
                record.is_productive = site.is_productive;
            }
        }
    }

    /// Key-value records describing the session, as written to storage.
    pub fn to_records(&self) -> HashMap<String, Value> {
        let mut records = HashMap::new();
        records.insert(keys::ACTIVE_SESSION.to_string(), json!(self.session.is_active()));
        records.insert(keys::SESSION_ID.to_string(), json!(self.session.id));
        records.insert(keys::SESSION_TASK.to_string(), json!(self.session.task));
        records.insert(keys::SESSION_START.to_string(), json!(self.session.started_at));
        records.insert(keys::SESSION_END.to_string(), json!(self.session.ended_at));
        records.insert(keys::VISITED_SITES.to_string(), json!(self.visited_sites));
        records.insert(keys::PRODUCTIVE_TIME.to_string(), json!(self.session.productive_ms));
        records.insert(
            keys::UNPRODUCTIVE_TIME.to_string(),
            json!(self.session.unproductive_ms),
        );
        records
    }

    /// Rebuilds session state from stored records. Absent or malformed values
    /// read as empty/zero. No site is current after a restore.
    pub fn restore(values: &HashMap<String, Value>) -> Self {
        let active: bool = field(values, keys::ACTIVE_SESSION);
        let started_at: Option<DateTime<Utc>> = field(values, keys::SESSION_START);
        let status = if active {
            SessionStatus::Active
        } else if started_at.is_some() {
            SessionStatus::Ended
        } else {
            SessionStatus::Idle
        };

        Self {
            session: Session {
                id: field(values, keys::SESSION_ID),
                status,
                task: field(values, keys::SESSION_TASK),
                started_at,
                ended_at: field(values, keys::SESSION_END),
                productive_ms: field(values, keys::PRODUCTIVE_TIME),
                unproductive_ms: field(values, keys::UNPRODUCTIVE_TIME),
            },
            current_site: None,
            visited_sites: field(values, keys::VISITED_SITES),
            site_anchor: None,
            visit: 0,
        }
    }
}

fn field<T: DeserializeOwned + Default>(values: &HashMap<String, Value>, key: &str) -> T {
    values
        .get(key)
        .cloned()
        .and_then(|value| serde_json::from_value(value).ok())
        .unwrap_or_default()
}
