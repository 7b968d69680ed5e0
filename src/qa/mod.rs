//! Question answering over a transcript or summary.
//!
//! Context selection narrows the document to the sentences sharing the most words with
//! the question, then the answer is the single best sentence of that context.

mod answer;
pub mod context;
mod suggest;

pub use answer::{answer, QaAnswer, MAX_CONFIDENCE, NO_ANSWER};
pub use context::select_context;
pub use suggest::{suggest_questions, MAX_SUGGESTIONS};

use crate::config::QaSettings;
use crate::error::{KortError, Result};
use crate::text::truncate_chars;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Chars of the selected context echoed back with an answer.
pub const CONTEXT_PREVIEW_CHARS: usize = 200;

/// An answer with the context it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaResult {
    pub answer: String,
    pub confidence: f64,
    /// The selected context, cut to [`CONTEXT_PREVIEW_CHARS`] with `...` appended when longer.
    pub context: String,
}

/// Answers questions about a document.
#[derive(Debug, Clone)]
pub struct QuestionAnswerer {
    top_k: usize,
}

impl Default for QuestionAnswerer {
    fn default() -> Self {
        Self::new(&QaSettings::default())
    }
}

impl QuestionAnswerer {
    pub fn new(settings: &QaSettings) -> Self {
        Self {
            top_k: settings.top_k.max(1),
        }
    }

    /// Answer `question` from `document`. Both must be non-blank.
    #[instrument(skip(self, document), fields(question = %question))]
    pub fn ask(&self, document: &str, question: &str) -> Result<QaResult> {
        if document.trim().is_empty() {
            return Err(KortError::Validation("Document text is required".to_string()));
        }
        if question.trim().is_empty() {
            return Err(KortError::Validation("Question is required".to_string()));
        }

        let context = select_context(document, question, self.top_k);
        let QaAnswer { answer, confidence } = answer(&context, question);
        info!("Answered with confidence {:.2}", confidence);

        Ok(QaResult {
            answer,
            confidence,
            context: preview(&context),
        })
    }
}

fn preview(context: &str) -> String {
    if context.chars().count() > CONTEXT_PREVIEW_CHARS {
        format!("{}...", truncate_chars(context, CONTEXT_PREVIEW_CHARS))
    } else {
        context.to_string()
    }
}
