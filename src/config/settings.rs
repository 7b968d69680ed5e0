//! Configuration settings for Kort.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Hard upper bound on concurrent items in a batch, whatever the config says.
pub const MAX_BATCH_WORKERS: usize = 20;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub acquisition: AcquisitionSettings,
    pub transcription: TranscriptionSettings,
    pub summarization: SummarizationSettings,
    pub qa: QaSettings,
    pub translation: TranslationSettings,
    pub batch: BatchSettings,
    pub server: ServerSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for temporary files (downloaded audio).
    pub temp_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            temp_dir: "/tmp/kort".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Settings shared by the metadata and transcript strategies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionSettings {
    /// Timeout for a single HTTP request, in seconds.
    pub http_timeout_seconds: u64,
    /// User agent sent with scraping requests.
    pub user_agent: String,
    /// Transcripts shorter than this are treated as failed attempts.
    pub min_transcript_chars: usize,
    /// Headless browser binaries, tried in order.
    pub browser_engines: Vec<String>,
    /// Timeout for one headless browser session, in seconds.
    pub browser_timeout_seconds: u64,
}

impl Default for AcquisitionSettings {
    fn default() -> Self {
        Self {
            http_timeout_seconds: 10,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/124.0 Safari/537.36"
                .to_string(),
            min_transcript_chars: 100,
            browser_engines: vec!["chromium".to_string(), "google-chrome".to_string()],
            browser_timeout_seconds: 30,
        }
    }
}

/// Audio download and speech-to-text settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Speech-to-text executable. Receives the audio path as its last argument and
    /// prints one JSON result object on the last line of stdout:
    /// `{"success": bool, "transcript": "...", "error": "..."}`.
    ///
    /// The default, `kort-whisper`, is not bundled. It names a user-installed wrapper
    /// around a local Whisper model; any program honouring the same contract works.
    pub speech_command: String,
    /// Extra arguments placed before the audio path.
    pub speech_args: Vec<String>,
    /// Deadline for the speech-to-text process, in seconds.
    pub speech_timeout_seconds: u64,
    /// Path or name of the yt-dlp binary.
    pub ytdlp_binary: String,
    /// Deadline for one audio download, in seconds.
    pub download_timeout_seconds: u64,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            speech_command: "kort-whisper".to_string(),
            speech_args: Vec::new(),
            speech_timeout_seconds: 20,
            ytdlp_binary: "yt-dlp".to_string(),
            download_timeout_seconds: 300,
        }
    }
}

/// Extractive summarization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizationSettings {
    /// Maximum characters per chunk.
    pub max_chunk_size: usize,
    /// Characters shared between adjacent chunks.
    pub overlap: usize,
    /// Sentences kept per chunk summary.
    pub max_sentences: usize,
    /// Domain keywords that boost a sentence's score.
    pub keywords: Vec<String>,
    /// Inputs shorter than this (after trimming) are rejected.
    pub min_input_chars: usize,
}

impl Default for SummarizationSettings {
    fn default() -> Self {
        Self {
            max_chunk_size: 1000,
            overlap: 100,
            max_sentences: 3,
            keywords: [
                "technology",
                "business",
                "educational",
                "innovation",
                "strategy",
                "learning",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            min_input_chars: 50,
        }
    }
}

/// Question answering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QaSettings {
    /// Number of sentences in the selected context window.
    pub top_k: usize,
}

impl Default for QaSettings {
    fn default() -> Self {
        Self { top_k: 3 }
    }
}

/// Translation provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct TranslationSettings {
    /// Base URL of a LibreTranslate-compatible service. None disables remote translation.
    pub provider_url: Option<String>,
    /// API key for the provider (optional).
    pub api_key: Option<String>,
}

/// Batch processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    /// Default number of items processed concurrently.
    pub max_workers: usize,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self { max_workers: 4 }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::KortError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("kort")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }

    /// Clamp a requested worker count into `1..=MAX_BATCH_WORKERS`.
    pub fn clamp_workers(requested: usize) -> usize {
        requested.clamp(1, MAX_BATCH_WORKERS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [summarization]
            max_sentences = 5

            [translation]
            provider_url = "http://localhost:5001"
            "#,
        )
        .unwrap();

        assert_eq!(settings.summarization.max_sentences, 5);
        assert_eq!(settings.summarization.max_chunk_size, 1000);
        assert_eq!(settings.transcription.speech_timeout_seconds, 20);
        assert_eq!(settings.translation.provider_url.as_deref(), Some("http://localhost:5001"));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.batch.max_workers = 7;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.batch.max_workers, 7);
    }

    #[test]
    fn test_clamp_workers() {
        assert_eq!(Settings::clamp_workers(0), 1);
        assert_eq!(Settings::clamp_workers(4), 4);
        assert_eq!(Settings::clamp_workers(500), MAX_BATCH_WORKERS);
    }
}
