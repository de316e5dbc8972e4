use thiserror::Error;

/// Failures talking to the remote text classifier. All of them lead to the
/// heuristic fallback.
#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("API key not configured (set GEMINI_API_KEY)")]
    MissingApiKey,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),
}
