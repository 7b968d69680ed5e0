//! Audio download and probing utilities.
//!
//! Audio is downloaded with yt-dlp into a caller-owned directory and inspected with ffprobe.

use crate::error::{KortError, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// Audio formats yt-dlp commonly produces, most preferred first.
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "m4a", "opus", "webm", "ogg", "wav"];

/// Downloads the audio track of a video into `output_dir`.
///
/// The directory is owned by the caller, which is responsible for removing it. A download
/// still running after `timeout` is killed.
#[instrument(skip(ytdlp_binary, output_dir, timeout), fields(video_id = %video_id))]
pub async fn download_audio(
    ytdlp_binary: &str,
    url: &str,
    video_id: &str,
    output_dir: &Path,
    timeout: Duration,
) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;

    info!("Downloading audio from {}", url);

    let template = output_dir.join(format!("{}.%(ext)s", video_id));

    let child = Command::new(ytdlp_binary)
        .arg("--format").arg("bestaudio[ext=m4a]/bestaudio")
        .arg("--output").arg(&template)
        .arg("--no-playlist")
        .arg("--quiet")
        .arg("--no-warnings")
        .arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| match KortError::from_spawn(ytdlp_binary, e) {
            KortError::ToolFailed(msg) => KortError::AudioDownload(msg),
            other => other,
        })?;

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| KortError::Timeout {
            operation: format!("audio download ({})", ytdlp_binary),
            seconds: timeout.as_secs(),
        })??;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(KortError::AudioDownload(format!("yt-dlp failed: {}", stderr.trim())));
    }

    find_audio_file(output_dir, video_id)
}

/// Locates a downloaded audio file by video ID.
fn find_audio_file(dir: &Path, video_id: &str) -> Result<PathBuf> {
    for ext in AUDIO_EXTENSIONS {
        let candidate = dir.join(format!("{}.{}", video_id, ext));
        if candidate.exists() {
            return Ok(candidate);
        }
    }

    // Fallback: scan directory for matching prefix
    let entries = std::fs::read_dir(dir)
        .map_err(|e| KortError::AudioDownload(format!("Cannot read directory: {e}")))?;

    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(video_id) && !name.ends_with(".part") {
            return Ok(entry.path());
        }
    }

    Err(KortError::AudioDownload("Audio file not found after download".into()))
}

/// Size of a file in bytes.
pub fn file_size(path: &Path) -> Result<u64> {
    Ok(std::fs::metadata(path)?.len())
}

/// Queries the duration of an audio file using ffprobe with JSON output.
pub async fn probe_duration(path: &Path) -> Result<f64> {
    let output = Command::new("ffprobe")
        .arg("-v").arg("quiet")
        .arg("-print_format").arg("json")
        .arg("-show_format")
        .arg(path)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| KortError::from_spawn("ffprobe", e))?;

    if !output.status.success() {
        return Err(KortError::ToolFailed("ffprobe returned error".into()));
    }

    let json_str = String::from_utf8_lossy(&output.stdout);
    let duration = parse_ffprobe_duration(&json_str)?;
    debug!("Probed duration {:.1}s for {:?}", duration, path);
    Ok(duration)
}

fn parse_ffprobe_duration(json: &str) -> Result<f64> {
    let parsed: serde_json::Value = serde_json::from_str(json)
        .map_err(|_| KortError::ToolFailed("Invalid ffprobe output".into()))?;

    parsed["format"]["duration"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| KortError::ToolFailed("Could not determine audio duration".into()))
}
