use std::collections::HashSet;

const STOP_WORDS: [&str; 16] = [
    "a", "an", "the", "and", "or", "but", "is", "are", "on", "in", "to", "for", "with", "by",
    "at", "of",
];

/// Terms of this length or shorter carry too little signal.
const MAX_DROPPED_LEN: usize = 2;
/// Only terms longer than this take part in substring matching.
const PARTIAL_MATCH_MIN_LEN: usize = 4;
const PARTIAL_MATCH_CREDIT: f64 = 0.5;

/// Lowercases `text`, replaces punctuation with spaces and returns the
/// remaining tokens in order, minus stop words and tokens of two characters
/// or fewer.
pub fn extract_terms(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    cleaned
        .split_whitespace()
        .filter(|term| term.len() > MAX_DROPPED_LEN && !STOP_WORDS.contains(term))
        .map(str::to_string)
        .collect()
}

/// Similarity of `terms_b` against `terms_a`, normalised by the smaller side.
///
/// Each term of `b` found verbatim in `a` scores 1. A longer `b` term without
/// an exact match scores 0.5 when it contains, or is contained in, some longer
/// `a` term (first hit wins). The result is not clamped to 1.
pub fn overlap(terms_a: &[String], terms_b: &[String]) -> f64 {
    if terms_a.is_empty() || terms_b.is_empty() {
        return 0.0;
    }

    let a_set: HashSet<&str> = terms_a.iter().map(String::as_str).collect();
    let mut matches = 0.0;

    for term in terms_b {
        if a_set.contains(term.as_str()) {
            matches += 1.0;
            continue;
        }

        if term.len() > PARTIAL_MATCH_MIN_LEN {
            let partial = terms_a.iter().any(|candidate| {
                candidate.len() > PARTIAL_MATCH_MIN_LEN
                    && (candidate.contains(term.as_str()) || term.contains(candidate.as_str()))
            });
            if partial {
                matches += PARTIAL_MATCH_CREDIT;
            }
        }
    }

    matches / terms_a.len().min(terms_b.len()) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(text: &str) -> Vec<String> {
        extract_terms(text)
    }

    #[test]
    fn extract_terms_drops_stop_words_short_tokens_and_punctuation() {
        assert_eq!(
            terms("The Rust-lang book: a guide to ownership, for beginners!"),
            vec!["rust", "lang", "book", "guide", "ownership", "beginners"]
        );
    }

    #[test]
    fn extract_terms_handles_empty_and_symbol_only_input() {
        assert!(terms("").is_empty());
        assert!(terms("   \t\n").is_empty());
        assert!(terms("!!! ?? -- ..").is_empty());
        assert!(terms("ab cd ef").is_empty());
    }

    #[test]
    fn extract_terms_keeps_underscores_and_digits() {
        assert_eq!(terms("snake_case v2 2024"), vec!["snake_case", "2024"]);
    }

    #[test]
    fn extract_terms_treats_non_ascii_letters_as_separators() {
        assert_eq!(terms("café crème brûlée"), vec!["caf"]);
    }

    #[test]
    fn overlap_is_zero_when_either_side_is_empty() {
        let some = terms("machine learning");
        assert_eq!(overlap(&[], &some), 0.0);
        assert_eq!(overlap(&some, &[]), 0.0);
        assert_eq!(overlap(&[], &[]), 0.0);
    }

    #[test]
    fn overlap_counts_exact_matches_over_smaller_side() {
        let task = terms("research machine learning");
        let title = terms("Machine Learning Research Papers");
        assert!((overlap(&task, &title) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn overlap_gives_half_credit_for_substring_matches() {
        let task = terms("programming");
        let title = terms("program");
        // "program" is longer than four characters and contained in "programming"
        assert!((overlap(&task, &title) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn overlap_ignores_short_terms_for_partial_matching() {
        let task = terms("cats");
        let title = terms("cat");
        assert_eq!(overlap(&task, &title), 0.0);
    }

    #[test]
    fn overlap_can_exceed_one() {
        let task = terms("rust");
        let title = terms("rust rust rust");
        assert!((overlap(&task, &title) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn overlap_of_unrelated_terms_is_zero() {
        let task = terms("finish report");
        let title = terms("Funny Cat Videos Compilation");
        assert_eq!(overlap(&task, &title), 0.0);
    }
}
