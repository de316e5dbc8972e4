use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::{
    sync::{broadcast, mpsc, Mutex},
    task::JoinHandle,
    time::{self, Instant},
};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    classification::ContentClassifier,
    models::{ClassificationRequest, PageContent, Session, SiteVisit},
    scraper::PageScraper,
    storage::{keys, Storage},
};

use super::{
    config::TrackerSettings,
    state::{Effect, Event, FocusedPage, Reply, TrackerState, Transition},
    summary::{summarize, SessionSummary},
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

const EVENT_CAPACITY: usize = 64;

/// Observer notifications. Delivery is best-effort: nothing is buffered for
/// subscribers that are not listening.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum TrackerEvent {
    SiteUpdated {
        site: Option<SiteVisit>,
    },
    UnproductiveAlert {
        hostname: String,
        task: String,
        message: String,
    },
    SessionEnded {
        summary: SessionSummary,
    },
}

/// Drives a `TrackerState`. Every event, whether from a command or from a
/// background task, is applied under the state lock and its effects are
/// carried out before the lock is released, so handling is strictly serial.
/// Background work (scraping, classification, timers) never touches the state
/// directly; it reports back through the inbox.
#[derive(Clone)]
pub struct TrackerController {
    state: Arc<Mutex<TrackerState>>,
    storage: Arc<dyn Storage>,
    classifier: Arc<ContentClassifier>,
    scraper: Arc<dyn PageScraper>,
    settings: TrackerSettings,
    tick_interval: Duration,
    events: broadcast::Sender<TrackerEvent>,
    inbox: mpsc::UnboundedSender<Event>,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
    shutdown: CancellationToken,
}

impl TrackerController {
    /// Spawns the event pump, so it must be called from within a tokio runtime.
    pub fn new(
        storage: Arc<dyn Storage>,
        classifier: ContentClassifier,
        scraper: Arc<dyn PageScraper>,
        settings: TrackerSettings,
    ) -> Self {
        let debug_mode = std::env::var("TASKFOCUS_DEBUG")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let (inbox, inbox_rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let controller = Self {
            state: Arc::new(Mutex::new(TrackerState::new())),
            storage,
            classifier: Arc::new(classifier),
            scraper,
            tick_interval: if debug_mode {
                Duration::from_secs(1)
            } else {
                settings.tick_interval()
            },
            settings,
            events,
            inbox,
            ticker: Arc::new(Mutex::new(None)),
            shutdown: CancellationToken::new(),
        };
        controller.spawn_pump(inbox_rx);
        controller
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TrackerEvent> {
        self.events.subscribe()
    }

    /// Reloads the last persisted session. An active session resumes with no
    /// current site until the host reports the focused page.
    pub async fn restore(&self) -> Result<()> {
        let values = self
            .storage
            .get(&keys::SESSION_KEYS)
            .await
            .context("failed to load session state")?;
        let restored = TrackerState::restore(&values);
        let active = restored.session.is_active();

        {
            let mut state = self.state.lock().await;
            *state = restored;
            if active {
                log_info!(
                    "Resumed active session {:?} for task \"{}\"",
                    state.session.id,
                    state.session.task
                );
            }
        }

        if active {
            self.spawn_ticker().await;
        }
        Ok(())
    }

    pub async fn start_session(&self, task: &str, focused: Option<FocusedPage>) -> Result<Session> {
        let reply = self
            .dispatch(Event::Start {
                task: task.to_string(),
                session_id: Uuid::new_v4().to_string(),
                focused,
            })
            .await;

        match reply {
            Reply::Rejected(reason) => Err(anyhow!(reason)),
            _ => Ok(self.session().await),
        }
    }

    /// Ends the active session, if any, and returns its final summary.
    pub async fn end_session(&self) -> SessionSummary {
        self.dispatch(Event::End).await;
        self.summary().await
    }

    /// Host-reported tab change. Returns whether a new site visit began.
    pub async fn navigate(&self, url: &str, title: &str) -> bool {
        let reply = self
            .dispatch(Event::Navigate {
                url: url.to_string(),
                title: title.to_string(),
            })
            .await;
        reply == Reply::Accepted
    }

    /// Content pushed by the host for `url`. Returns false when `url` is no
    /// longer the current site.
    pub async fn report_content(&self, url: &str, content: PageContent) -> bool {
        let reply = self
            .dispatch(Event::ContentArrived {
                url: url.to_string(),
                content: Some(content),
            })
            .await;
        reply == Reply::Accepted
    }

    /// Flips the current site's verdict. `None` when no site is current.
    pub async fn toggle_classification(&self) -> Option<bool> {
        match self.dispatch(Event::Toggle).await {
            Reply::Toggled(is_productive) => Some(is_productive),
            _ => None,
        }
    }

    pub async fn tick(&self) {
        self.dispatch(Event::Tick).await;
    }

    pub async fn current_site(&self) -> Option<SiteVisit> {
        self.state.lock().await.current_site.clone()
    }

    pub async fn session(&self) -> Session {
        self.state.lock().await.session.clone()
    }

    pub async fn summary(&self) -> SessionSummary {
        let state = self.state.lock().await;
        summarize(&state, Utc::now())
    }

    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        self.cancel_ticker().await;
    }

    async fn dispatch(&self, event: Event) -> Reply {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let Transition { reply, effects } = state.apply(event, now, &self.settings);

        for effect in effects {
            self.run_effect(&state, effect, now).await;
        }
        reply
    }

    async fn run_effect(&self, state: &TrackerState, effect: Effect, now: DateTime<Utc>) {
        match effect {
            Effect::SessionStarted => {
                log_info!(
                    "Session {:?} started for task \"{}\"",
                    state.session.id,
                    state.session.task
                );
                self.spawn_ticker().await;
            }
            Effect::Persist => {
                if let Err(err) = self.storage.set(state.to_records()).await {
                    log_warn!("Failed to persist session state, retrying on next flush: {err:?}");
                }
            }
            Effect::NotifySiteUpdated => {
                let _ = self.events.send(TrackerEvent::SiteUpdated {
                    site: state.current_site.clone(),
                });
            }
            Effect::FetchContent { url, title } => self.spawn_scrape(url, title),
            Effect::Classify { visit, quick, full } => {
                self.spawn_classification(visit, quick, full)
            }
            Effect::ScheduleAlert { visit, url } => self.spawn_alert(visit, url),
            Effect::RaiseAlert { hostname, task } => {
                let message = format!(
                    "You've spent over {} on {} which appears unproductive for your task: {}",
                    self.settings.alert_delay_label(),
                    hostname,
                    task
                );
                log_info!("{message}");
                let _ = self.events.send(TrackerEvent::UnproductiveAlert {
                    hostname,
                    task,
                    message,
                });
            }
            Effect::RecordFeedback { url, record } => {
                if let Err(err) = self.classifier.feedback().record(&url, record).await {
                    log_error!("Failed to record feedback for {url}: {err:?}");
                }
            }
            Effect::SessionEnded => {
                self.cancel_ticker().await;
                let summary = summarize(state, now);
                log_info!(
                    "Session {:?} ended: {}ms productive, {}ms unproductive over {} sites",
                    summary.session_id,
                    summary.productive_ms,
                    summary.unproductive_ms,
                    summary.sites.len()
                );
                let _ = self.events.send(TrackerEvent::SessionEnded { summary });
            }
        }
    }

    fn spawn_pump(&self, mut inbox_rx: mpsc::UnboundedReceiver<Event>) {
        let controller = self.clone();
        let token = self.shutdown.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    event = inbox_rx.recv() => match event {
                        Some(event) => {
                            controller.dispatch(event).await;
                        }
                        None => break,
                    },
                }
            }
        });
    }

    fn spawn_scrape(&self, url: String, title: String) {
        let scraper = self.scraper.clone();
        let inbox = self.inbox.clone();

        tokio::spawn(async move {
            let content = match scraper.scrape(&url, &title).await {
                Ok(Some(content)) => Some(content),
                // Content will be reported by the host.
                Ok(None) => return,
                Err(err) => {
                    log_warn!("Scraping {url} failed, classifying without content: {err:?}");
                    None
                }
            };
            let _ = inbox.send(Event::ContentArrived { url, content });
        });
    }

    fn spawn_classification(
        &self,
        visit: u64,
        quick: Option<ClassificationRequest>,
        full: ClassificationRequest,
    ) {
        let classifier = self.classifier.clone();
        let inbox = self.inbox.clone();

        tokio::spawn(async move {
            if let Some(request) = quick {
                let verdict = classifier.quick_classify(&request).await;
                let _ = inbox.send(Event::QuickVerdict {
                    visit,
                    url: request.url,
                    verdict,
                });
            }

            let result = classifier.classify(&full).await;
            let _ = inbox.send(Event::FullVerdict {
                visit,
                url: full.url,
                verdict: result.verdict,
                elapsed_ms: result.elapsed_ms,
            });
        });
    }

    fn spawn_alert(&self, visit: u64, url: String) {
        let inbox = self.inbox.clone();
        let token = self.shutdown.clone();
        let delay = self.settings.unproductive_alert_delay();

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = time::sleep(delay) => {
                    let _ = inbox.send(Event::AlertDue { visit, url });
                }
            }
        });
    }

    async fn spawn_ticker(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(handle) = ticker_guard.take() {
            handle.abort();
        }

        let inbox = self.inbox.clone();
        let token = self.shutdown.clone();
        let period = self.tick_interval;

        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        if inbox.send(Event::Tick).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        *ticker_guard = Some(handle);
    }

    async fn cancel_ticker(&self) {
        if let Some(handle) = self.ticker.lock().await.take() {
            handle.abort();
        }
    }
}
