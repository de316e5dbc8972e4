use serde::{Deserialize, Serialize};

pub const NO_EXPLANATION: &str = "No explanation provided";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub is_productive: bool,
    pub explanation: String,
}

impl Verdict {
    pub fn new(is_productive: bool, explanation: impl Into<String>) -> Self {
        Self {
            is_productive,
            explanation: explanation.into(),
        }
    }

    /// Renders the verdict in the two-line labelled form the remote service
    /// answers with, so cached and computed verdicts share one format.
    pub fn to_labelled_text(&self) -> String {
        let label = if self.is_productive {
            "productive"
        } else {
            "unproductive"
        };
        format!("CLASSIFICATION: {label}\nEXPLANATION: {}", self.explanation)
    }
}

/// Where a full classification came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum VerdictSource {
    Cache,
    Service,
    Fallback,
}

impl VerdictSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerdictSource::Cache => "cache",
            VerdictSource::Service => "service",
            VerdictSource::Fallback => "fallback",
        }
    }
}
