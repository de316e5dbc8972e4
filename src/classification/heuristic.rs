use chrono::{DateTime, Utc};
use url::Url;

use crate::classification::config::ClassificationConfig;
use crate::classification::feedback::{feedback_adjustment, FeedbackLog};
use crate::classification::terms::{extract_terms, overlap};
use crate::models::{ClassificationRequest, Verdict};

/// (host fragment, path prefix, query parameter) of recognised result pages.
const SEARCH_ENGINES: [(&str, &str, &str); 5] = [
    ("google.", "/search", "q"),
    ("bing.com", "/search", "q"),
    ("duckduckgo.com", "/", "q"),
    ("search.yahoo.com", "/search", "p"),
    ("youtube.com", "/results", "search_query"),
];

/// Weighted relevance components behind a heuristic verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct RelevanceScore {
    pub title: f64,
    pub content: f64,
    /// Present only when the URL carried a non-empty search query.
    pub search: Option<f64>,
    /// Present only when metadata produced any terms.
    pub metadata: Option<f64>,
    pub feedback_adjustment: f64,
    pub weighted: f64,
    pub adjusted: f64,
}

/// Scores `request` against its task. Pure: the feedback log is passed in.
pub fn score(
    request: &ClassificationRequest,
    feedback: &FeedbackLog,
    config: &ClassificationConfig,
    now: DateTime<Utc>,
) -> RelevanceScore {
    let task_terms = extract_terms(&request.task);
    let title_terms = extract_terms(&request.title);
    let content_head: String = request
        .content
        .chars()
        .take(config.heuristic_content_chars)
        .collect();
    let content_terms = extract_terms(&content_head);
    let metadata_terms = request
        .metadata
        .as_ref()
        .and_then(|metadata| serde_json::to_string(metadata).ok())
        .map(|text| extract_terms(&text))
        .unwrap_or_default();
    let search_terms = extract_terms(&search_query(&request.url));

    let title = overlap(&task_terms, &title_terms) * config.weight_title;
    let content = overlap(&task_terms, &content_terms) * config.weight_content;

    let mut total = title + content;
    let mut total_weight = config.weight_title + config.weight_content;

    let search = (!search_terms.is_empty()).then(|| {
        let value = overlap(&task_terms, &search_terms) * config.weight_search;
        total += value;
        total_weight += config.weight_search;
        value
    });

    let metadata = (!metadata_terms.is_empty()).then(|| {
        let value = overlap(&task_terms, &metadata_terms) * config.weight_metadata;
        total += value;
        total_weight += config.weight_metadata;
        value
    });

    let weighted = if total_weight > 0.0 {
        total / total_weight
    } else {
        0.0
    };
    let adjustment = feedback_adjustment(&request.url, &task_terms, feedback, config, now);

    RelevanceScore {
        title,
        content,
        search,
        metadata,
        feedback_adjustment: adjustment,
        weighted,
        adjusted: weighted + adjustment,
    }
}

pub fn classify(
    request: &ClassificationRequest,
    feedback: &FeedbackLog,
    config: &ClassificationConfig,
    now: DateTime<Utc>,
) -> Verdict {
    let relevance = score(request, feedback, config, now);
    let is_productive = relevance.adjusted > config.productive_threshold;
    Verdict::new(is_productive, explain(&relevance, is_productive))
}

fn explain(relevance: &RelevanceScore, is_productive: bool) -> String {
    let mut factors = vec![
        format!("title relevance: {:.2}", relevance.title),
        format!("content relevance: {:.2}", relevance.content),
    ];
    if let Some(search) = relevance.search {
        factors.push(format!("search query relevance: {search:.2}"));
    }
    if let Some(metadata) = relevance.metadata {
        factors.push(format!("metadata relevance: {metadata:.2}"));
    }
    if relevance.feedback_adjustment != 0.0 {
        factors.push(format!(
            "user feedback adjustment: {:.2}",
            relevance.feedback_adjustment
        ));
    }

    let factors = factors.join(", ");
    if is_productive {
        format!("The content appears relevant to your task with factors: {factors}.")
    } else {
        format!("The content has low relevance to your task with factors: {factors}.")
    }
}

/// Query string of a recognised search-results URL; empty for anything else,
/// including URLs that fail to parse.
pub fn search_query(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return String::new();
    };
    let Some(host) = parsed.host_str() else {
        return String::new();
    };

    SEARCH_ENGINES
        .iter()
        .find(|(fragment, path, _)| host.contains(fragment) && parsed.path().starts_with(path))
        .and_then(|(_, _, param)| {
            parsed
                .query_pairs()
                .find(|(name, _)| &**name == *param)
                .map(|(_, value)| value.into_owned())
        })
        .unwrap_or_default()
}
