//! Extractive answers: the context sentence sharing the most words with the question.

use crate::text::{match_count, sentences, tokenize};
use serde::{Deserialize, Serialize};

/// Returned when the context has no usable sentence.
pub const NO_ANSWER: &str = "I couldn't find a specific answer to your question.";
/// Confidence attached to [`NO_ANSWER`].
pub const NO_ANSWER_CONFIDENCE: f64 = 0.1;
/// Word overlap never yields more confidence than this.
pub const MAX_CONFIDENCE: f64 = 0.9;

/// An answer and the share of question words it matched.
///
/// `confidence` is a heuristic overlap ratio in `[0, 1]`, not a probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaAnswer {
    pub answer: String,
    pub confidence: f64,
}

/// Pick the best-matching sentence of `context`. Ties go to the earliest sentence.
pub fn answer(context: &str, question: &str) -> QaAnswer {
    let candidates = sentences(context);
    let Some(first) = candidates.first() else {
        return QaAnswer {
            answer: NO_ANSWER.to_string(),
            confidence: NO_ANSWER_CONFIDENCE,
        };
    };

    let question_tokens = tokenize(question);
    let mut best = *first;
    let mut max_matches = 0;

    for sentence in &candidates {
        let matches = match_count(&question_tokens, &tokenize(sentence));
        if matches > max_matches {
            max_matches = matches;
            best = sentence;
        }
    }

    let confidence = if question_tokens.is_empty() {
        0.0
    } else {
        (max_matches as f64 / question_tokens.len() as f64).min(MAX_CONFIDENCE)
    };

    QaAnswer {
        answer: best.trim().to_string(),
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cats_and_dogs() {
        let result = answer("Cats are mammals. Dogs are mammals too.", "What are cats?");
        assert!(result.answer.contains("Cats are mammals"));
        assert!(result.confidence > 0.0);
        assert!((result.confidence - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_is_capped() {
        let result = answer(
            "Rust ownership prevents data races. Something else entirely here.",
            "rust ownership prevents races",
        );
        assert_eq!(result.confidence, MAX_CONFIDENCE);
        assert_eq!(result.answer, "Rust ownership prevents data races");
    }

    #[test]
    fn test_question_without_tokens() {
        let result = answer("Cats are mammals. Dogs are mammals too.", "is it?");
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.answer, "Cats are mammals");
    }

    #[test]
    fn test_no_sentences() {
        let result = answer("Too short.", "What is this about?");
        assert_eq!(result.answer, NO_ANSWER);
        assert_eq!(result.confidence, NO_ANSWER_CONFIDENCE);
    }

    #[test]
    fn test_confidence_bounds() {
        let contexts = [
            "One sentence about the weather today.",
            "Alpha beta gamma delta. Epsilon zeta eta theta.",
            "",
        ];
        let questions = ["weather?", "what about alpha and theta", "", "x"];
        for context in contexts {
            for question in questions {
                let result = answer(context, question);
                assert!((0.0..=1.0).contains(&result.confidence));
            }
        }
    }
}
