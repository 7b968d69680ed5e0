//! Audio download plus speech-to-text.
//!
//! The speech command is an external process. It receives the audio path as its last
//! argument and must print one JSON object on the last line of stdout:
//! `{"success": bool, "transcript": "...", "error": "..."}`. Anything on stderr is
//! diagnostics. When the command fails or times out the strategy degrades to a
//! placeholder built from measurable audio properties, clearly marked as such.

use super::check_length;
use crate::acquisition::Strategy;
use crate::audio;
use crate::config::TranscriptionSettings;
use crate::error::{KortError, Result};
use crate::metadata::duration::format_seconds;
use crate::source::SourceReference;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

/// Label that opens every placeholder transcript.
pub const PLACEHOLDER_LABEL: &str = "[Audio Content Detected]";

#[derive(Debug, Deserialize)]
struct SpeechResult {
    success: bool,
    #[serde(default)]
    transcript: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Downloads audio and runs the configured speech-to-text command on it.
pub struct AudioTranscriptionStrategy {
    settings: TranscriptionSettings,
    temp_root: PathBuf,
    min_chars: usize,
    ffprobe: bool,
}

impl AudioTranscriptionStrategy {
    pub fn new(settings: TranscriptionSettings, temp_root: PathBuf, min_chars: usize) -> Self {
        Self {
            settings,
            temp_root,
            min_chars,
            ffprobe: true,
        }
    }

    /// Whether ffprobe can be used to measure duration for the placeholder.
    pub fn with_ffprobe(mut self, available: bool) -> Self {
        self.ffprobe = available;
        self
    }

    async fn transcribe_in(&self, source: &SourceReference, dir: &Path) -> Result<String> {
        let audio_path = audio::download_audio(
            &self.settings.ytdlp_binary,
            &source.url,
            source.content_id.as_str(),
            dir,
            Duration::from_secs(self.settings.download_timeout_seconds),
        )
        .await?;

        match self.run_speech(&audio_path).await {
            Ok(text) if check_length(&text, self.min_chars).is_ok() => Ok(text),
            Ok(text) => {
                warn!("Speech-to-text returned only {} chars, using placeholder", text.chars().count());
                self.placeholder(&audio_path).await
            }
            Err(e) => {
                warn!("Speech-to-text failed: {}, using placeholder", e);
                self.placeholder(&audio_path).await
            }
        }
    }

    #[instrument(skip(self))]
    async fn run_speech(&self, audio_path: &Path) -> Result<String> {
        let command = &self.settings.speech_command;
        let timeout = Duration::from_secs(self.settings.speech_timeout_seconds);

        let child = Command::new(command)
            .args(&self.settings.speech_args)
            .arg(audio_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| KortError::from_spawn(command, e))?;

        // Dropping the future on timeout drops the child, which kills it.
        let output = tokio::time::timeout(timeout, child.wait_with_output())
            .await
            .map_err(|_| KortError::Timeout {
                operation: format!("speech-to-text ({})", command),
                seconds: timeout.as_secs(),
            })??;

        for line in String::from_utf8_lossy(&output.stderr).lines() {
            debug!("{}: {}", command, line);
        }

        if !output.status.success() {
            return Err(KortError::ToolFailed(format!(
                "{} exited with {}",
                command, output.status
            )));
        }

        parse_speech_output(&String::from_utf8_lossy(&output.stdout))
    }

    async fn placeholder(&self, audio_path: &Path) -> Result<String> {
        let size = audio::file_size(audio_path)?;
        let duration = if self.ffprobe {
            match audio::probe_duration(audio_path).await {
                Ok(secs) => Some(secs),
                Err(e) => {
                    debug!("Could not probe duration: {}", e);
                    None
                }
            }
        } else {
            None
        };
        Ok(placeholder_transcript(size, duration))
    }
}

#[async_trait]
impl Strategy<String> for AudioTranscriptionStrategy {
    fn name(&self) -> &'static str {
        "audio-transcription"
    }

    #[instrument(skip_all, fields(video_id = %source.content_id))]
    async fn acquire(&self, source: &SourceReference) -> Result<String> {
        std::fs::create_dir_all(&self.temp_root)?;
        let dir = tempfile::Builder::new()
            .prefix("kort-audio-")
            .tempdir_in(&self.temp_root)?;

        let result = self.transcribe_in(source, dir.path()).await;

        let dir_path = dir.path().to_path_buf();
        if let Err(e) = dir.close() {
            warn!("Failed to remove temporary audio in {:?}: {}", dir_path, e);
        }

        if result.is_ok() {
            info!("Audio transcription finished");
        }
        result
    }

    fn validate(&self, value: &String) -> std::result::Result<(), String> {
        check_length(value, self.min_chars)
    }
}

/// Read the result object from the last non-empty stdout line.
fn parse_speech_output(stdout: &str) -> Result<String> {
    let line = stdout
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| KortError::ToolFailed("speech command produced no output".into()))?;

    let result: SpeechResult = serde_json::from_str(line)
        .map_err(|e| KortError::ToolFailed(format!("unparseable speech result: {}", e)))?;

    match (result.success, result.transcript) {
        (true, Some(text)) if !text.trim().is_empty() => Ok(text.trim().to_string()),
        (true, _) => Err(KortError::ToolFailed("speech command returned no transcript".into())),
        (false, _) => Err(KortError::ToolFailed(
            result.error.unwrap_or_else(|| "speech command reported failure".into()),
        )),
    }
}

/// Non-authoritative stand-in built from audio properties.
///
/// When no measured duration is available it is estimated at roughly one minute per MB.
pub fn placeholder_transcript(size_bytes: u64, duration_secs: Option<f64>) -> String {
    let size_kb = size_bytes / 1024;
    let (duration, basis) = match duration_secs {
        Some(secs) => (format_seconds(secs.round() as u64), "measured"),
        None => (format_seconds((size_kb / 1000).max(1) * 60), "estimated"),
    };

    format!(
        "{PLACEHOLDER_LABEL}\n\n\
         This is a placeholder, not a transcript. The audio was downloaded, but speech-to-text \
         did not produce any text for it, so nothing below describes what is actually said.\n\n\
         Audio properties:\n\
         - File size: {size_kb}KB\n\
         - Duration: {duration} ({basis})\n\n\
         For an accurate transcript, choose a video with captions enabled."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_speech_output_uses_last_line() {
        let stdout = "loading model...\n{\"progress\": 50}\n{\"success\": true, \"transcript\": \" hello there \"}\n\n";
        assert_eq!(parse_speech_output(stdout).unwrap(), "hello there");
    }

    #[test]
    fn test_parse_speech_output_failure() {
        let err = parse_speech_output(r#"{"success": false, "error": "model not found"}"#).unwrap_err();
        assert!(err.to_string().contains("model not found"));

        assert!(parse_speech_output("").is_err());
        assert!(parse_speech_output("not json").is_err());
        assert!(parse_speech_output(r#"{"success": true}"#).is_err());
    }

    #[test]
    fn test_placeholder_is_labelled_and_long_enough() {
        let text = placeholder_transcript(3 * 1024 * 1024, Some(185.4));
        assert!(text.starts_with(PLACEHOLDER_LABEL));
        assert!(text.contains("3072KB"));
        assert!(text.contains("3:05 (measured)"));
        assert!(check_length(&text, 100).is_ok());

        let estimated = placeholder_transcript(1024, None);
        assert!(estimated.contains("1:00 (estimated)"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_speech_reads_last_stdout_line() {
        let dir = tempfile::tempdir().unwrap();
        let command = crate::testing::write_script(
            dir.path(),
            "speech-helper",
            r#"if [ "$1" = "--version" ]; then exit 2; fi
echo "loading model" >&2
echo "progress 100%"
echo "{\"success\": true, \"transcript\": \"heard $(basename "$1")\"}""#,
        );
        let settings = TranscriptionSettings {
            speech_command: command.to_str().unwrap().to_string(),
            ..Default::default()
        };
        let strategy = AudioTranscriptionStrategy::new(settings, dir.path().to_path_buf(), 10);

        let text = strategy.run_speech(Path::new("/tmp/clip.m4a")).await.unwrap();
        assert_eq!(text, "heard clip.m4a");
    }

    #[tokio::test]
    async fn test_missing_downloader_fails_and_cleans_up() {
        let root = tempfile::tempdir().unwrap();
        let settings = TranscriptionSettings {
            ytdlp_binary: "kort-no-such-ytdlp".to_string(),
            ..Default::default()
        };
        let strategy = AudioTranscriptionStrategy::new(settings, root.path().to_path_buf(), 100);
        let source = SourceReference::parse("dQw4w9WgXcQ").unwrap();

        let err = strategy.acquire(&source).await.unwrap_err();
        assert!(matches!(err, KortError::ToolNotFound(_)));
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }
}
