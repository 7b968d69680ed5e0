//! Splitting long text into bounded, overlapping, sentence-aligned chunks.

use crate::text::normalize_whitespace;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How far back from a window boundary to look for a sentence terminator, in chars.
pub const SENTENCE_LOOKBACK: usize = 200;

/// A chunk of normalized text. Offsets are char positions, end exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub start_offset: usize,
    pub end_offset: usize,
}

impl Chunk {
    /// Length in chars.
    pub fn len(&self) -> usize {
        self.end_offset - self.start_offset
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Split `text` into chunks of at most `max_size` chars.
///
/// Whitespace is normalized first and offsets refer to the normalized text. A window that
/// would end mid-sentence is cut just after the last terminator within the preceding
/// [`SENTENCE_LOOKBACK`] chars, or exactly at `max_size` when there is none. Each chunk
/// after the first starts `overlap` chars before the previous one ended.
pub fn chunk_text(text: &str, max_size: usize, overlap: usize) -> Vec<Chunk> {
    let normalized = normalize_whitespace(text);
    let chars: Vec<char> = normalized.chars().collect();
    let len = chars.len();
    let max_size = max_size.max(1);

    if len == 0 {
        return Vec::new();
    }
    if len <= max_size {
        return vec![Chunk {
            text: normalized,
            start_offset: 0,
            end_offset: len,
        }];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        let mut end = (start + max_size).min(len);

        if end < len {
            let floor = start.max(end.saturating_sub(SENTENCE_LOOKBACK));
            if let Some(i) = (floor..end).rev().find(|&i| is_terminator(chars[i])) {
                end = i + 1;
            }
        }

        chunks.push(Chunk {
            text: chars[start..end].iter().collect(),
            start_offset: start,
            end_offset: end,
        });

        if end >= len {
            break;
        }

        // Always advance, even when the cut landed within `overlap` of the start.
        let next = end.saturating_sub(overlap);
        start = if next > start { next } else { end };
    }

    debug!("Split {} chars into {} chunks", len, chunks.len());
    chunks
}
