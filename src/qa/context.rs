//! Selecting the sentences of a document most relevant to a question.

use crate::text::{join_sentences, match_count, sentences, tokenize, truncate_chars};
use tracing::debug;

/// Chars of the document used as context when no sentence matches the question.
pub const FALLBACK_CONTEXT_CHARS: usize = 500;

/// A sentence with its relevance score and position in the document.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredSentence<'a> {
    pub sentence: &'a str,
    pub score: usize,
    pub index: usize,
}

/// Score every sentence of `document` against the tokens of `question`.
pub fn score_sentences<'a>(document: &'a str, question: &str) -> Vec<ScoredSentence<'a>> {
    let question_tokens = tokenize(question);
    sentences(document)
        .into_iter()
        .enumerate()
        .map(|(index, sentence)| ScoredSentence {
            sentence,
            score: match_count(&question_tokens, &tokenize(sentence)),
            index,
        })
        .collect()
}

/// The `top_k` best-scoring sentences, restored to document order.
///
/// When nothing matches, or the document has no usable sentences, the first
/// [`FALLBACK_CONTEXT_CHARS`] chars of the document are returned instead.
pub fn select_context(document: &str, question: &str, top_k: usize) -> String {
    let mut scored = score_sentences(document, question);

    if scored.iter().all(|s| s.score == 0) {
        debug!("No sentence matches the question, using document head");
        return truncate_chars(document.trim(), FALLBACK_CONTEXT_CHARS).to_string();
    }

    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored.truncate(top_k.max(1));
    scored.sort_by_key(|s| s.index);

    let picked: Vec<&str> = scored.iter().map(|s| s.sentence).collect();
    join_sentences(&picked)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "Rust was first released in 2015. \
                       The borrow checker enforces ownership at compile time. \
                       Many teams adopted it for systems work. \
                       Cargo handles builds and dependency management. \
                       Ownership rules prevent data races in threads.";

    #[test]
    fn test_top_sentences_in_document_order() {
        let context = select_context(DOC, "How does ownership prevent races?", 2);
        assert_eq!(
            context,
            "The borrow checker enforces ownership at compile time. \
             Ownership rules prevent data races in threads."
        );
    }

    #[test]
    fn test_no_match_falls_back_to_head() {
        let long = "Completely unrelated sentence here. ".repeat(30);
        let context = select_context(&long, "zebra quantum?", 3);
        assert_eq!(context.chars().count(), FALLBACK_CONTEXT_CHARS);
        assert!(long.starts_with(&context));
    }

    #[test]
    fn test_short_question_tokens_are_ignored() {
        let scored = score_sentences(DOC, "is it so?");
        assert!(scored.iter().all(|s| s.score == 0));
        assert_eq!(scored.len(), 5);
    }
}
