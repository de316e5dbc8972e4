use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::verdict::NO_EXPLANATION;
use crate::models::{ClassificationRequest, Verdict};

const TRUNCATION_MARKER: &str = "... (content truncated for length)";
const NO_CONTENT: &str = "No content available";

static PRODUCTIVE_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)classification:\s*\[?\s*productive\b").expect("valid classification regex")
});

static EXPLANATION_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)explanation:[ \t]*(.*)").expect("valid explanation regex"));

/// Builds the instruction sent to the remote classifier. Page text beyond
/// `content_limit` characters is cut and marked as truncated.
pub fn build_prompt(request: &ClassificationRequest, content_limit: usize) -> String {
    let summary = if request.content.is_empty() {
        NO_CONTENT.to_string()
    } else if request.content.chars().count() > content_limit {
        let head: String = request.content.chars().take(content_limit).collect();
        format!("{head}{TRUNCATION_MARKER}")
    } else {
        request.content.clone()
    };

    format!(
        r#"
Task Context: "{task}"
URL: {url}
Page Title: {title}
Page Content Summary: {summary}

Based ONLY on the relevance of this content to the user's task context, classify whether this webpage is productive or unproductive for the user's current task.

DO NOT use any preset rules about specific topics, domains, or categories. Analyze the actual content and its relevance to the task.

Consider factors like:
1. How directly relevant is the content to completing the user's task?
2. Does the content provide useful information for the task context?
3. Is the content likely to distract from the task rather than support it?

Respond in this exact format:
CLASSIFICATION: [productive/unproductive]
EXPLANATION: [brief explanation focused only on content relevance to the task]
"#,
        task = request.task,
        url = request.url,
        title = request.title,
    )
}

/// Parses a labelled two-line answer. Tolerates case, brackets and missing
/// lines; never fails. Anything other than a "productive" label reads as
/// unproductive.
pub fn parse_verdict(text: &str) -> Verdict {
    let is_productive = PRODUCTIVE_LABEL.is_match(text);
    let explanation = EXPLANATION_LINE
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().trim())
        .filter(|explanation| !explanation.is_empty())
        .unwrap_or(NO_EXPLANATION);

    Verdict::new(is_productive, explanation)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(content: &str) -> ClassificationRequest {
        ClassificationRequest {
            url: "https://example.com/post".into(),
            title: "A Post".into(),
            task: "write blog post".into(),
            content: content.into(),
            metadata: None,
        }
    }

    #[test]
    fn prompt_embeds_task_url_and_title() {
        let prompt = build_prompt(&request("short body"), 2000);
        assert!(prompt.contains("Task Context: \"write blog post\""));
        assert!(prompt.contains("URL: https://example.com/post"));
        assert!(prompt.contains("Page Title: A Post"));
        assert!(prompt.contains("Page Content Summary: short body\n"));
        assert!(prompt.contains("CLASSIFICATION: [productive/unproductive]"));
    }

    #[test]
    fn prompt_truncates_long_content_with_marker() {
        let body = "x".repeat(2500);
        let prompt = build_prompt(&request(&body), 2000);
        let expected = format!("{}{}", "x".repeat(2000), TRUNCATION_MARKER);
        assert!(prompt.contains(&expected));
        assert!(!prompt.contains(&"x".repeat(2001)));
    }

    #[test]
    fn prompt_marks_missing_content() {
        let prompt = build_prompt(&request(""), 2000);
        assert!(prompt.contains("Page Content Summary: No content available"));
    }

    #[test]
    fn parses_plain_and_bracketed_labels() {
        let plain = parse_verdict("CLASSIFICATION: productive\nEXPLANATION: On topic.");
        assert!(plain.is_productive);
        assert_eq!(plain.explanation, "On topic.");

        let bracketed = parse_verdict("classification: [Productive]\nexplanation: Docs page");
        assert!(bracketed.is_productive);
        assert_eq!(bracketed.explanation, "Docs page");
    }

    #[test]
    fn unproductive_label_is_not_mistaken_for_productive() {
        let verdict = parse_verdict("CLASSIFICATION: [unproductive]\nEXPLANATION: Social feed.");
        assert!(!verdict.is_productive);
        assert_eq!(verdict.explanation, "Social feed.");
    }

    #[test]
    fn missing_fields_degrade_gracefully() {
        let verdict = parse_verdict("I am not sure what you mean.");
        assert!(!verdict.is_productive);
        assert_eq!(verdict.explanation, NO_EXPLANATION);

        let empty_explanation = parse_verdict("CLASSIFICATION: productive\nEXPLANATION:");
        assert!(empty_explanation.is_productive);
        assert_eq!(empty_explanation.explanation, NO_EXPLANATION);
    }

    #[test]
    fn reparsing_labelled_text_is_idempotent() {
        let first = parse_verdict("Classification:  productive \nExplanation: relevant docs");
        let second = parse_verdict(&first.to_labelled_text());
        assert_eq!(first, second);
    }
}
