//! Keyword heuristics over free-text interaction outcomes.
//!
//! Matching is whole-word and case-insensitive. The word lists are the only
//! tuning surface; callers see booleans and counts, so a real text
//! classifier can replace this module without touching the scorers.

use std::sync::OnceLock;

use regex::Regex;

/// Outcome words that mark an interaction as having gone well.
const POSITIVE_WORDS: &[&str] = &[
    "positive",
    "interested",
    "agreed",
    "approved",
    "success",
    "successful",
    "excellent",
    "great",
    "good",
    "satisfied",
    "happy",
    "pleased",
    "committed",
    "won",
    "signed",
    "ordered",
    "productive",
    "enthusiastic",
    "expanding",
    "renewed",
];

/// Phrases that indicate a competitor is in the account.
const COMPETITOR_PHRASES: &[&str] = &[
    "competitor",
    "competitors",
    "competing",
    "competitive bid",
    "alternative supplier",
    "other vendor",
    "another vendor",
    "switching",
    "switch to",
    "rival",
];

fn word_regex(words: &[&str]) -> Regex {
    let alternation = words
        .iter()
        .map(|w| regex::escape(w).replace(' ', r"\s+"))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternation})\b")).unwrap()
}

fn positive_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| word_regex(POSITIVE_WORDS))
}

fn competitor_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| word_regex(COMPETITOR_PHRASES))
}

/// True when the outcome contains at least one positive word.
pub fn is_positive(outcome: &str) -> bool {
    positive_re().is_match(outcome)
}

/// True when the outcome mentions competitor activity.
pub fn mentions_competitor(outcome: &str) -> bool {
    competitor_re().is_match(outcome)
}

/// Percent of `outcomes` that read positive; `None` when there are none.
pub fn positivity_ratio<'a>(outcomes: impl IntoIterator<Item = &'a str>) -> Option<f64> {
    let (total, positive) = outcomes
        .into_iter()
        .fold((0usize, 0usize), |(total, positive), text| {
            (total + 1, positive + usize::from(is_positive(text)))
        });
    if total == 0 {
        None
    } else {
        Some(100.0 * positive as f64 / total as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_matches_whole_words_only() {
        assert!(is_positive("Buyer was very INTERESTED in the new line"));
        assert!(is_positive("Great call"));
        assert!(!is_positive("Goodwill gesture requested"));
        assert!(!is_positive("No response"));
    }

    #[test]
    fn test_competitor_phrases() {
        assert!(mentions_competitor("They are talking to another  vendor"));
        assert!(mentions_competitor("Competitor pricing came up"));
        assert!(!mentions_competitor("Competent team, no issues"));
    }

    #[test]
    fn test_positivity_ratio() {
        assert_eq!(positivity_ratio(Vec::<&str>::new()), None);
        assert_eq!(
            positivity_ratio(["great demo", "pricing pushback", "signed PO", "no show"]),
            Some(50.0)
        );
    }
}
