pub mod adapter;
pub mod cache;
pub mod config;
pub mod error;
pub mod feedback;
pub mod heuristic;
pub mod prompt;
pub mod service;
pub mod terms;

pub use adapter::{Classification, ContentClassifier};
pub use cache::ClassificationCache;
pub use config::ClassificationConfig;
pub use error::ClassifierError;
pub use feedback::{FeedbackLog, FeedbackStore};
pub use service::{GeminiClassifier, ServiceConfig, TextClassifier};
