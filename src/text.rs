//! Sentence splitting and tokenization shared by summarization and question answering.

use regex::Regex;
use std::sync::OnceLock;

/// Fragments this short (in chars) are not treated as sentences.
pub const MIN_SENTENCE_CHARS: usize = 10;

fn terminator_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.!?]+").expect("Invalid regex"))
}

/// Collapse whitespace runs to single spaces and trim.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split on sentence terminators, trimming each piece. Empty pieces are dropped.
pub fn raw_sentences(text: &str) -> Vec<&str> {
    terminator_regex()
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Sentences longer than [`MIN_SENTENCE_CHARS`], in document order.
pub fn sentences(text: &str) -> Vec<&str> {
    raw_sentences(text)
        .into_iter()
        .filter(|s| s.chars().count() > MIN_SENTENCE_CHARS)
        .collect()
}

/// Join sentences back into prose, terminating each with a period.
pub fn join_sentences<S: AsRef<str>>(sentences: &[S]) -> String {
    if sentences.is_empty() {
        return String::new();
    }
    let joined = sentences
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(". ");
    format!("{}.", joined)
}

/// Lowercase words with punctuation removed; words of two chars or fewer are dropped.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(|w| w.chars().filter(|c| c.is_alphanumeric() || *c == '_').collect::<String>())
        .filter(|w| w.chars().count() > 2)
        .collect()
}

/// Number of `query` tokens that substring-match any of `tokens`, in either direction.
pub fn match_count(query: &[String], tokens: &[String]) -> usize {
    query
        .iter()
        .filter(|q| {
            tokens
                .iter()
                .any(|t| t.contains(q.as_str()) || q.contains(t.as_str()))
        })
        .count()
}

/// First `max_chars` chars of `text`, cut on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
