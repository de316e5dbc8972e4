//! Remote text classifier.
//!
//! The tracker only needs "prompt in, free text out"; `TextClassifier` is the
//! seam, `GeminiClassifier` the default provider.

use std::env;

use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::classification::error::ClassifierError;

const DEFAULT_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";
const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[async_trait]
pub trait TextClassifier: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, ClassifierError>;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    pub endpoint: String,
    /// Falls back to the GEMINI_API_KEY environment variable when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
        }
    }
}

impl ServiceConfig {
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| env::var(API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty())
    }
}

pub struct GeminiClassifier {
    endpoint: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<RequestContent>,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

impl GeminiClassifier {
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            api_key: config.resolved_api_key(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl TextClassifier for GeminiClassifier {
    async fn complete(&self, prompt: &str) -> Result<String, ClassifierError> {
        let api_key = self.api_key.as_deref().ok_or(ClassifierError::MissingApiKey)?;
        debug!("Calling classification service");

        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Status { status, body });
        }

        let body = response.text().await?;
        extract_text(&body)
    }
}

/// Pulls `candidates[0].content.parts[0].text` out of a response body.
fn extract_text(body: &str) -> Result<String, ClassifierError> {
    let parsed: GenerateResponse = serde_json::from_str(body)
        .map_err(|err| ClassifierError::Malformed(format!("invalid JSON: {err}")))?;

    parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().next())
        .map(|part| part.text)
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| ClassifierError::Malformed("response carried no text".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_candidate_text() {
        let body = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "CLASSIFICATION: productive\nEXPLANATION: ok"}], "role": "model"}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ],
            "usageMetadata": {"totalTokenCount": 12}
        }"#;
        assert_eq!(
            extract_text(body).unwrap(),
            "CLASSIFICATION: productive\nEXPLANATION: ok"
        );
    }

    #[test]
    fn empty_or_invalid_responses_are_malformed() {
        for body in [
            "{}",
            r#"{"candidates": []}"#,
            r#"{"candidates": [{"finishReason": "SAFETY"}]}"#,
            r#"{"candidates": [{"content": {"parts": [{"text": "  "}]}}]}"#,
            "not json",
        ] {
            assert!(
                matches!(extract_text(body), Err(ClassifierError::Malformed(_))),
                "{body}"
            );
        }
    }

    #[test]
    fn explicit_api_key_wins_over_environment() {
        let config = ServiceConfig {
            api_key: Some("explicit".into()),
            ..ServiceConfig::default()
        };
        assert_eq!(config.resolved_api_key().as_deref(), Some("explicit"));
    }

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let classifier = GeminiClassifier {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            client: reqwest::Client::new(),
        };
        assert!(matches!(
            classifier.complete("prompt").await,
            Err(ClassifierError::MissingApiKey)
        ));
    }
}
