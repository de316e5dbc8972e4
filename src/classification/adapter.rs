use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::time;

use crate::classification::cache::ClassificationCache;
use crate::classification::config::ClassificationConfig;
use crate::classification::error::ClassifierError;
use crate::classification::feedback::{FeedbackLog, FeedbackStore};
use crate::classification::heuristic;
use crate::classification::prompt::{build_prompt, parse_verdict};
use crate::classification::service::TextClassifier;
use crate::models::{ClassificationRequest, Verdict, VerdictSource};
use crate::storage::Storage;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub verdict: Verdict,
    pub source: VerdictSource,
    pub elapsed_ms: u64,
}

/// Full-content classification: cache, then the remote service, then the
/// heuristic when anything goes wrong. Always yields a verdict.
pub struct ContentClassifier {
    service: Arc<dyn TextClassifier>,
    cache: ClassificationCache,
    feedback: FeedbackStore,
    config: ClassificationConfig,
}

impl ContentClassifier {
    pub fn new(
        service: Arc<dyn TextClassifier>,
        storage: Arc<dyn Storage>,
        config: ClassificationConfig,
    ) -> Self {
        Self {
            service,
            cache: ClassificationCache::new(storage.clone(), &config),
            feedback: FeedbackStore::new(storage),
            config,
        }
    }

    /// The correction log this classifier scores against.
    pub fn feedback(&self) -> &FeedbackStore {
        &self.feedback
    }

    /// Instant title-only verdict shown while the full classification runs.
    pub async fn quick_classify(&self, request: &ClassificationRequest) -> Verdict {
        self.heuristic(&request.title_only()).await
    }

    pub async fn classify(&self, request: &ClassificationRequest) -> Classification {
        let started = Instant::now();

        match self.cache.get(&request.url, &request.task).await {
            Ok(Some(raw)) => {
                return Classification {
                    verdict: parse_verdict(&raw),
                    source: VerdictSource::Cache,
                    elapsed_ms: started.elapsed().as_millis() as u64,
                };
            }
            Ok(None) => {}
            Err(err) => log_warn!("classification cache read failed for {}: {err:?}", request.url),
        }

        let prompt = build_prompt(request, self.config.prompt_content_chars);
        let call = self.service.complete(&prompt);
        let outcome = match time::timeout(self.config.service_timeout(), call).await {
            Ok(result) => result,
            Err(_) => Err(ClassifierError::Timeout(self.config.service_timeout_secs)),
        };

        let (verdict, source) = match outcome {
            Ok(raw) => {
                if let Err(err) = self.cache.put(&request.url, &request.task, &raw).await {
                    log_warn!("failed to cache classification for {}: {err:?}", request.url);
                }
                (parse_verdict(&raw), VerdictSource::Service)
            }
            Err(err) => {
                log_warn!(
                    "classification service failed for {}: {err}; using heuristic fallback",
                    request.url
                );
                (self.heuristic(request).await, VerdictSource::Fallback)
            }
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        log_info!(
            "Classified {} as {} via {} in {}ms",
            request.url,
            if verdict.is_productive { "productive" } else { "unproductive" },
            source.as_str(),
            elapsed_ms
        );

        Classification {
            verdict,
            source,
            elapsed_ms,
        }
    }

    async fn heuristic(&self, request: &ClassificationRequest) -> Verdict {
        // Feedback is a best-effort bias; score without it when storage fails.
        let feedback = match self.feedback.load().await {
            Ok(log) => log,
            Err(err) => {
                log_warn!("feedback lookup failed, scoring without it: {err:?}");
                FeedbackLog::new()
            }
        };
        heuristic::classify(request, &feedback, &self.config, Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FeedbackRecord;
    use crate::storage::MemoryStorage;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Mutex;

    struct ScriptedService {
        replies: Mutex<VecDeque<Result<String, ClassifierError>>>,
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedService {
        fn new(replies: Vec<Result<String, ClassifierError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl TextClassifier for ScriptedService {
        async fn complete(&self, prompt: &str) -> Result<String, ClassifierError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().await.push(prompt.to_string());
            self.replies
                .lock()
                .await
                .pop_front()
                .unwrap_or_else(|| Err(ClassifierError::Malformed("script exhausted".into())))
        }
    }

    struct StalledService;

    #[async_trait]
    impl TextClassifier for StalledService {
        async fn complete(&self, _prompt: &str) -> Result<String, ClassifierError> {
            time::sleep(Duration::from_secs(3600)).await;
            Ok("CLASSIFICATION: productive\nEXPLANATION: too late".into())
        }
    }

    fn request(title: &str, task: &str) -> ClassificationRequest {
        ClassificationRequest {
            url: "https://www.youtube.com/watch?v=1".into(),
            title: title.into(),
            task: task.into(),
            content: "Some page text".into(),
            metadata: None,
        }
    }

    #[tokio::test]
    async fn service_answer_is_parsed_and_cached() {
        let service = ScriptedService::new(vec![Ok(
            "CLASSIFICATION: unproductive\nEXPLANATION: Entertainment video.".into(),
        )]);
        let classifier = ContentClassifier::new(
            service.clone(),
            Arc::new(MemoryStorage::new()),
            ClassificationConfig::default(),
        );
        let req = request("Funny Cats", "finish report");

        let first = classifier.classify(&req).await;
        assert_eq!(first.source, VerdictSource::Service);
        assert!(!first.verdict.is_productive);
        assert_eq!(first.verdict.explanation, "Entertainment video.");

        let second = classifier.classify(&req).await;
        assert_eq!(second.source, VerdictSource::Cache);
        assert_eq!(second.verdict, first.verdict);
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);

        let prompts = service.prompts.lock().await;
        assert!(prompts[0].contains("Task Context: \"finish report\""));
    }

    #[tokio::test]
    async fn transport_failure_falls_back_to_heuristic_without_caching() {
        let service = ScriptedService::new(vec![
            Err(ClassifierError::Status {
                status: 503,
                body: "unavailable".into(),
            }),
            Ok("CLASSIFICATION: unproductive\nEXPLANATION: later".into()),
        ]);
        let classifier = ContentClassifier::new(
            service.clone(),
            Arc::new(MemoryStorage::new()),
            ClassificationConfig::default(),
        );
        let req = request("Quarterly Report Template", "finish report");

        let first = classifier.classify(&req).await;
        assert_eq!(first.source, VerdictSource::Fallback);
        assert!(first.verdict.is_productive);
        assert!(first.verdict.explanation.contains("title relevance"));

        let second = classifier.classify(&req).await;
        assert_eq!(second.source, VerdictSource::Service);
        assert_eq!(service.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_service_times_out_into_fallback() {
        let classifier = ContentClassifier::new(
            Arc::new(StalledService),
            Arc::new(MemoryStorage::new()),
            ClassificationConfig::default(),
        );
        let result = classifier.classify(&request("Funny Cats", "finish report")).await;
        assert_eq!(result.source, VerdictSource::Fallback);
        assert!(!result.verdict.is_productive);
    }

    #[tokio::test]
    async fn quick_classify_uses_title_and_feedback_only() {
        let storage = Arc::new(MemoryStorage::new());
        let feedback = FeedbackStore::new(storage.clone());
        feedback
            .record(
                "https://www.youtube.com/watch?v=0",
                FeedbackRecord {
                    task: "finish report".into(),
                    is_productive: true,
                    timestamp: Utc::now(),
                },
            )
            .await
            .unwrap();

        let service = ScriptedService::new(vec![]);
        let classifier =
            ContentClassifier::new(service.clone(), storage, ClassificationConfig::default());

        let verdict = classifier
            .quick_classify(&request("Funny Cats", "finish report"))
            .await;
        assert!(verdict.is_productive);
        assert!(verdict.explanation.contains("user feedback adjustment: 0.20"));
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    }
}
