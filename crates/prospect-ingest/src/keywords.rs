//! Keyword extraction for lexical search over stored entities.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Keyword cap used when enriching a stored entity.
pub const DEFAULT_KEYWORD_LIMIT: usize = 30;
/// Upper bound accepted from callers.
pub const MAX_KEYWORD_LIMIT: usize = 50;

static WORD_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W+").expect("static regex"));

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "and", "for", "are", "but", "not", "you", "all", "any", "can", "had", "her",
        "was", "one", "our", "out", "day", "get", "has", "him", "his", "how", "its", "may",
        "new", "now", "old", "see", "two", "who", "did", "she", "use", "way", "with", "this",
        "that", "from", "they", "will", "have", "been", "were", "said", "each", "which",
        "their", "there", "what", "about", "would", "make", "like", "into", "time", "more",
        "some", "than", "them", "then", "these", "also", "only", "over", "such", "other",
        "very", "just", "your", "where", "while", "when", "most", "both", "being", "does",
        "through", "after", "before", "under", "between", "across", "within", "company",
        "companies", "inc", "llc", "ltd", "corp",
    ]
    .into_iter()
    .collect()
});

/// Extract up to `limit` keywords from `text`.
///
/// Lowercases, splits on non-word boundaries, drops stop words, tokens of two
/// characters or fewer and tokens with non-alphabetic characters. Order of
/// first appearance is preserved.
pub fn extract_keywords(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.min(MAX_KEYWORD_LIMIT);
    let lowered = text.to_lowercase();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut keywords = Vec::new();

    for token in WORD_SPLIT.split(&lowered) {
        if keywords.len() >= limit {
            break;
        }
        if token.chars().count() <= 2
            || !token.chars().all(char::is_alphabetic)
            || STOP_WORDS.contains(token)
        {
            continue;
        }
        if seen.insert(token) {
            keywords.push(token.to_string());
        }
    }

    keywords
}
