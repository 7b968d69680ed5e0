//! Extractive summarization.
//!
//! Each chunk contributes its highest-scoring sentences, kept in their original order.
//! Chunk summaries are concatenated, and summarized once more when the result is still
//! longer than a single chunk.

use crate::chunking::chunk_text;
use crate::config::SummarizationSettings;
use crate::error::{KortError, Result};
use crate::text::{join_sentences, raw_sentences, sentences, truncate_chars};
use tracing::{debug, info, instrument};

/// Bonus per keyword found in a sentence.
const KEYWORD_BONUS: usize = 20;
/// Bonus for sentences in the first 30% of a chunk.
const LEAD_BONUS: usize = 15;
/// Bonus for sentences in the last 30% of a chunk.
const CONCLUSION_BONUS: usize = 10;
/// Merged summaries longer than this are summarized again.
const MERGE_LIMIT: usize = 1000;

#[derive(Debug, Clone)]
pub struct ExtractiveSummarizer {
    max_chunk_size: usize,
    overlap: usize,
    max_sentences: usize,
    keywords: Vec<String>,
    min_input_chars: usize,
}

impl Default for ExtractiveSummarizer {
    fn default() -> Self {
        Self::new(&SummarizationSettings::default())
    }
}

impl ExtractiveSummarizer {
    pub fn new(settings: &SummarizationSettings) -> Self {
        Self {
            max_chunk_size: settings.max_chunk_size,
            overlap: settings.overlap,
            max_sentences: settings.max_sentences.max(1),
            keywords: settings.keywords.iter().map(|k| k.to_lowercase()).collect(),
            min_input_chars: settings.min_input_chars,
        }
    }

    /// Builder method to set how many sentences each chunk contributes.
    pub fn with_max_sentences(mut self, n: usize) -> Self {
        self.max_sentences = n.max(1);
        self
    }

    /// Summarize `text`.
    ///
    /// Fails only when the trimmed input is shorter than the configured minimum. The
    /// result never has more chars than the input.
    #[instrument(skip_all, fields(chars = text.len()))]
    pub fn summarize(&self, text: &str) -> Result<String> {
        let source_len = text.chars().count();
        if text.trim().chars().count() < self.min_input_chars {
            return Err(KortError::Validation("Text is too short to summarize".to_string()));
        }

        let chunks = chunk_text(text, self.max_chunk_size, self.overlap);
        let summaries: Vec<String> = chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| {
                debug!("Summarizing chunk {}/{}", i + 1, chunks.len());
                self.extract(&chunk.text)
            })
            .collect();

        let mut summary = if summaries.len() == 1 {
            summaries.into_iter().next().unwrap_or_default()
        } else {
            let merged = summaries.join(" ");
            if merged.chars().count() > MERGE_LIMIT {
                self.extract(&merged)
            } else {
                merged
            }
        };

        if summary.chars().count() > source_len {
            summary = truncate_chars(&summary, source_len).trim_end().to_string();
        }

        info!("Summary of {} chars from {} chunks", summary.chars().count(), chunks.len());
        Ok(summary)
    }

    /// Pick the top sentences of one chunk and return them in document order.
    pub fn extract(&self, text: &str) -> String {
        let candidates = sentences(text);
        let n = self.max_sentences;

        if candidates.is_empty() {
            return self.first_sentences(text);
        }
        if candidates.len() <= n {
            return join_sentences(&candidates);
        }

        let total = candidates.len() as f64;
        let mut scored: Vec<(usize, usize)> = candidates
            .iter()
            .enumerate()
            .map(|(idx, sentence)| (idx, self.score(sentence, idx, total)))
            .collect();

        // Stable sort keeps earlier sentences first among equal scores
        scored.sort_by(|a, b| b.1.cmp(&a.1));
        let mut top: Vec<usize> = scored.into_iter().take(n).map(|(idx, _)| idx).collect();
        top.sort_unstable();

        let picked: Vec<&str> = top.into_iter().map(|idx| candidates[idx]).collect();
        join_sentences(&picked)
    }

    fn score(&self, sentence: &str, index: usize, total: f64) -> usize {
        let lower = sentence.to_lowercase();
        let mut score = sentence.chars().count();

        score += self
            .keywords
            .iter()
            .filter(|k| lower.contains(k.as_str()))
            .count()
            * KEYWORD_BONUS;

        let position = index as f64;
        if position < total * 0.3 {
            score += LEAD_BONUS;
        } else if position > total * 0.7 {
            score += CONCLUSION_BONUS;
        }
        score
    }

    /// Fallback when no sentence is long enough to score.
    fn first_sentences(&self, text: &str) -> String {
        let raw = raw_sentences(text);
        if raw.is_empty() {
            return text.trim().to_string();
        }
        let take = raw.len().min(self.max_sentences);
        join_sentences(&raw[..take])
    }
}
