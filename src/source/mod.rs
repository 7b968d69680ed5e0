//! Source references and their normalized content identifiers.
//!
//! Every acquisition strategy receives a [`SourceReference`]. Two references that resolve
//! to the same [`ContentId`] describe the same content, whatever URL form was submitted.

pub mod youtube;

use crate::error::{KortError, Result};
use serde::{Deserialize, Serialize};

/// Stable identifier of a piece of content (the YouTube video ID).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A submitted source together with its normalized identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReference {
    /// The string as submitted by the caller.
    pub raw: String,
    /// Normalized identifier.
    pub content_id: ContentId,
    /// Canonical watch URL derived from the identifier.
    pub url: String,
}

impl SourceReference {
    /// Parse a URL or bare video ID.
    pub fn parse(input: &str) -> Result<Self> {
        let video_id = youtube::extract_video_id(input).ok_or_else(|| {
            KortError::InvalidInput(format!("Invalid YouTube video ID or URL: {}", input))
        })?;

        Ok(Self {
            raw: input.trim().to_string(),
            url: youtube::watch_url(&video_id),
            content_id: ContentId(video_id),
        })
    }

    /// Whether two references point at the same content.
    pub fn same_content(&self, other: &SourceReference) -> bool {
        self.content_id == other.content_id
    }
}

impl std::str::FromStr for SourceReference {
    type Err = KortError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
