//! Transcript acquisition.
//!
//! Strategies, in order: caption tracks, audio download plus speech-to-text, and a
//! rendered-page scrape. Strategies whose tools are missing are left out of the list.
//! When every strategy fails the result is [`Transcript::Unavailable`], carrying an
//! explanation for the user instead of invented text.

pub mod browser;
pub mod captions;
pub mod speech;

use crate::acquisition::browser::BrowserEngine;
use crate::acquisition::{http, Acquisition, Attempt, ContentFetcher, Strategy, StrategyUsed};
use crate::config::Settings;
use crate::error::{KortError, Result};
use crate::preflight::Capabilities;
use crate::source::SourceReference;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

pub use browser::BrowserTranscriptStrategy;
pub use captions::CaptionsStrategy;
pub use speech::{AudioTranscriptionStrategy, PLACEHOLDER_LABEL};

/// Marker carried by the unavailable-transcript message.
pub const UNAVAILABLE_MARKER: &str = "TRANSCRIPT NOT AVAILABLE";

/// Message returned when no strategy produced a transcript.
pub fn unavailable_message() -> String {
    format!(
        "{UNAVAILABLE_MARKER}\n\n\
         We could not get a transcript for this video.\n\n\
         What to do:\n\
         - Choose a video with captions enabled\n\
         - Look for videos that show the \"CC\" (closed captions) button\n\
         - Educational channels usually publish transcripts\n\n\
         Please try a different video that has captions enabled."
    )
}

/// Whether a piece of text is the unavailable-transcript message.
pub fn is_unavailable_text(text: &str) -> bool {
    text.contains(UNAVAILABLE_MARKER)
}

/// Minimum length check shared by every transcript strategy.
pub(crate) fn check_length(text: &str, min_chars: usize) -> std::result::Result<(), String> {
    let len = text.trim().chars().count();
    if len < min_chars {
        Err(format!("transcript too short ({} chars, need {})", len, min_chars))
    } else {
        Ok(())
    }
}

/// Where a transcript came from, or the attempts that failed to produce one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptSource {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<StrategyUsed>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attempts: Vec<Attempt>,
    /// The text is derived from audio properties, not speech recognition.
    pub placeholder: bool,
}

/// Result of transcript acquisition.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Transcript {
    Available {
        text: String,
        strategy: StrategyUsed,
    },
    Unavailable {
        message: String,
        attempts: Vec<Attempt>,
    },
}

impl Transcript {
    pub fn is_available(&self) -> bool {
        matches!(self, Transcript::Available { .. })
    }

    /// The transcript, or the explanation when none could be acquired.
    pub fn text(&self) -> &str {
        match self {
            Transcript::Available { text, .. } => text,
            Transcript::Unavailable { message, .. } => message,
        }
    }

    pub fn strategy(&self) -> Option<&StrategyUsed> {
        match self {
            Transcript::Available { strategy, .. } => Some(strategy),
            Transcript::Unavailable { .. } => None,
        }
    }

    /// The transcript text, or an [`KortError::Acquisition`] carrying every attempt.
    pub fn into_text(self, target: &str) -> Result<String> {
        match self {
            Transcript::Available { text, .. } => Ok(text),
            Transcript::Unavailable { attempts, .. } => Err(KortError::Acquisition {
                target: target.to_string(),
                attempts,
            }),
        }
    }

    /// Split into the text (or the unavailable message) and its provenance.
    pub fn into_parts(self) -> (String, TranscriptSource) {
        let placeholder = self.is_placeholder();
        match self {
            Transcript::Available { text, strategy } => (
                text,
                TranscriptSource {
                    available: true,
                    strategy: Some(strategy),
                    attempts: Vec::new(),
                    placeholder,
                },
            ),
            Transcript::Unavailable { message, attempts } => (
                message,
                TranscriptSource {
                    available: false,
                    strategy: None,
                    attempts,
                    placeholder: false,
                },
            ),
        }
    }

    /// Whether the text is a placeholder derived from audio properties.
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Transcript::Available { text, .. } if text.starts_with(PLACEHOLDER_LABEL))
    }
}

impl From<Acquisition<String>> for Transcript {
    fn from(acquisition: Acquisition<String>) -> Self {
        match acquisition {
            Acquisition::Acquired { value, strategy, .. } => Transcript::Available {
                text: value,
                strategy,
            },
            Acquisition::Exhausted { attempts, fallback } => Transcript::Unavailable {
                message: fallback,
                attempts,
            },
        }
    }
}

/// Ordered transcript acquisition for a source.
pub struct TranscriptAcquirer {
    fetcher: ContentFetcher<String>,
}

impl TranscriptAcquirer {
    /// Build the strategy list from settings, keeping only what the machine can run.
    pub fn new(settings: &Settings, capabilities: &Capabilities) -> Result<Self> {
        let min_chars = settings.acquisition.min_transcript_chars;
        let client = http::create_client(&settings.acquisition)?;

        let mut strategies: Vec<Arc<dyn Strategy<String>>> =
            vec![Arc::new(CaptionsStrategy::new(client, min_chars))];

        if capabilities.audio_transcription() {
            strategies.push(Arc::new(
                AudioTranscriptionStrategy::new(
                    settings.transcription.clone(),
                    settings.temp_dir(),
                    min_chars,
                )
                .with_ffprobe(capabilities.ffprobe),
            ));
        }

        if let Some(engine) = capabilities.browsers.first() {
            let engine = BrowserEngine::new(
                engine.clone(),
                Duration::from_secs(settings.acquisition.browser_timeout_seconds),
            )
            .with_user_agent(settings.acquisition.user_agent.clone());
            strategies.push(Arc::new(BrowserTranscriptStrategy::new(engine, min_chars)));
        }

        Ok(Self::with_strategies(strategies))
    }

    /// Use an explicit strategy list.
    pub fn with_strategies(strategies: Vec<Arc<dyn Strategy<String>>>) -> Self {
        Self {
            fetcher: ContentFetcher::new("transcript", strategies),
        }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.fetcher.strategy_names()
    }

    /// Acquire a transcript. Never fails; exhaustion yields [`Transcript::Unavailable`].
    #[instrument(skip(self, source), fields(video_id = %source.content_id))]
    pub async fn acquire(&self, source: &SourceReference) -> Transcript {
        let transcript: Transcript = self
            .fetcher
            .fetch(source, |_| unavailable_message())
            .await
            .into();

        match &transcript {
            Transcript::Available { text, strategy } => info!(
                "Transcript of {} chars via {} (method {})",
                text.chars().count(),
                strategy.name,
                strategy.position
            ),
            Transcript::Unavailable { attempts, .. } => {
                info!("Transcript unavailable after {} attempts", attempts.len())
            }
        }
        transcript
    }
}
