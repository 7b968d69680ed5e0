//! Pre-flight checks and capability probing.
//!
//! External tools decide which acquisition strategies can run at all. They are probed
//! once, up front, so strategy lists only contain what this machine can actually do.

use crate::config::Settings;
use crate::error::{KortError, Result};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Upper bound for a single `--version` probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Processing a video has no hard requirements; missing tools only disable strategies.
    ProcessVideo,
    /// Processing a document at the given path.
    ProcessDocument,
}

/// Run pre-flight checks for the given operation.
pub async fn check(operation: Operation, path: Option<&Path>) -> Result<()> {
    match operation {
        Operation::ProcessVideo => {}
        Operation::ProcessDocument => {
            let is_pdf = path
                .and_then(|p| p.extension())
                .map(|e| e.eq_ignore_ascii_case("pdf"))
                .unwrap_or(false);
            if is_pdf {
                probe_tool("pdftotext").await?;
                probe_tool("pdfinfo").await?;
            }
        }
    }
    Ok(())
}

/// ffmpeg-family tools and poppler use a single-dash version flag.
fn version_arg(name: &str) -> &'static str {
    let base = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(name);
    match base {
        "ffmpeg" | "ffprobe" => "-version",
        "pdftotext" | "pdfinfo" => "-v",
        _ => "--version",
    }
}

/// Check if an external tool is available and runs.
pub async fn probe_tool(name: &str) -> Result<()> {
    let arg = version_arg(name);

    let child = Command::new(name)
        .arg(arg)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| KortError::from_spawn(name, e))?;

    let status = tokio::time::timeout(PROBE_TIMEOUT, child.wait_with_output())
        .await
        .map_err(|_| KortError::Timeout {
            operation: format!("{} {}", name, arg),
            seconds: PROBE_TIMEOUT.as_secs(),
        })??
        .status;

    // poppler's -v exits non-zero on some versions
    if status.success() || version_arg(name) == "-v" {
        Ok(())
    } else {
        Err(KortError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        )))
    }
}

/// Check that a command can be started, without relying on any flag it understands.
///
/// Used for the speech-to-text command, whose only contract is "audio path in, one JSON
/// line out". The process is killed as soon as it has been spawned.
pub async fn probe_command(name: &str) -> Result<()> {
    let mut child = Command::new(name)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| KortError::from_spawn(name, e))?;

    if let Err(e) = child.kill().await {
        debug!("Could not stop {} after probing: {}", name, e);
    }
    Ok(())
}

/// Which optional tools are present on this machine.
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    pub ytdlp: bool,
    pub ffprobe: bool,
    pub speech: bool,
    /// Browser engines that responded, in configured order.
    pub browsers: Vec<String>,
    pub pdftotext: bool,
}

impl Capabilities {
    /// Probe every tool named in the settings concurrently.
    pub async fn probe(settings: &Settings) -> Self {
        let ytdlp = &settings.transcription.ytdlp_binary;
        let speech = &settings.transcription.speech_command;

        let (ytdlp, ffprobe, speech, pdftotext) = tokio::join!(
            probe_tool(ytdlp),
            probe_tool("ffprobe"),
            probe_command(speech),
            probe_tool("pdftotext"),
        );

        let browser_probes = futures::future::join_all(
            settings
                .acquisition
                .browser_engines
                .iter()
                .map(|engine| async move { (engine.clone(), probe_tool(engine).await.is_ok()) }),
        )
        .await;

        let caps = Self {
            ytdlp: ytdlp.is_ok(),
            ffprobe: ffprobe.is_ok(),
            speech: speech.is_ok(),
            browsers: browser_probes
                .into_iter()
                .filter_map(|(engine, ok)| ok.then_some(engine))
                .collect(),
            pdftotext: pdftotext.is_ok(),
        };
        debug!("Probed capabilities: {:?}", caps);
        caps
    }

    /// Audio transcription needs both the downloader and the speech command.
    pub fn audio_transcription(&self) -> bool {
        self.ytdlp && self.speech
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_video_processing_has_no_requirements() {
        assert!(check(Operation::ProcessVideo, None).await.is_ok());
    }

    #[tokio::test]
    async fn test_text_document_needs_no_tools() {
        assert!(check(Operation::ProcessDocument, Some(Path::new("notes.txt"))).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_tool() {
        let err = probe_tool("kort-definitely-missing-tool").await.unwrap_err();
        assert!(matches!(err, KortError::ToolNotFound(_)));
    }

    #[test]
    fn test_version_arg() {
        assert_eq!(version_arg("/usr/bin/ffprobe"), "-version");
        assert_eq!(version_arg("pdftotext"), "-v");
        assert_eq!(version_arg("/usr/bin/pdfinfo"), "-v");
        assert_eq!(version_arg("yt-dlp"), "--version");
    }

    #[tokio::test]
    async fn test_missing_command() {
        let err = probe_command("kort-definitely-missing-tool").await.unwrap_err();
        assert!(matches!(err, KortError::ToolNotFound(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_speech_command_without_version_flag_is_present() {
        let dir = tempfile::tempdir().unwrap();
        let speech = crate::testing::write_script(
            dir.path(),
            "speech-helper",
            r#"if [ "$1" = "--version" ]; then exit 2; fi
echo '{"success":true,"transcript":"hello"}'"#,
        );
        let speech = speech.to_str().unwrap().to_string();

        assert!(probe_tool(&speech).await.is_err());
        assert!(probe_command(&speech).await.is_ok());

        let mut settings = Settings::default();
        settings.transcription.speech_command = speech;
        settings.acquisition.browser_engines.clear();
        let caps = Capabilities::probe(&settings).await;
        assert!(caps.speech);
    }

    #[test]
    fn test_audio_transcription_needs_both_tools() {
        let caps = Capabilities { ytdlp: true, ..Default::default() };
        assert!(!caps.audio_transcription());
    }
}
