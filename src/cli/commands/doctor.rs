//! Doctor command - verify external tools and report active acquisition methods.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::preflight::{probe_command, probe_tool, Capabilities};
use console::style;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
///
/// Every tool is optional: a missing one only removes the methods that need it and is
/// reported as a warning. Only an unusable temp directory is an error.
pub async fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Kort Doctor");
    println!();
    println!("Checking external tools and configuration...\n");

    let mut checks = Vec::new();

    println!("{}", style("External Tools").bold());
    let transcription = &settings.transcription;
    let tools = [
        (transcription.ytdlp_binary.as_str(), install_hint_ytdlp(), "audio transcription"),
        ("ffprobe", install_hint_ffmpeg(), "measured audio duration"),
        ("pdftotext", install_hint_poppler(), "PDF documents"),
        ("pdfinfo", install_hint_poppler(), "PDF page counts"),
    ];
    for (tool, hint, feature) in tools {
        let check = check_tool(tool, hint, feature).await;
        check.print();
        checks.push(check);
    }
    let speech = check_speech_command(&transcription.speech_command).await;
    speech.print();
    checks.push(speech);

    println!();
    println!("{}", style("Browser Engines").bold());
    for engine in &settings.acquisition.browser_engines {
        let check = check_tool(engine, install_hint_browser(), "browser scraping").await;
        check.print();
        checks.push(check);
    }

    println!();
    println!("{}", style("Translation").bold());
    let translation = match &settings.translation.provider_url {
        Some(url) if !url.is_empty() => CheckResult::ok("Provider", url),
        _ => CheckResult::warning(
            "Provider",
            "not configured",
            "Set translation.provider_url to a LibreTranslate server to enable translation",
        ),
    };
    translation.print();
    checks.push(translation);

    println!();
    println!("{}", style("Configuration").bold());
    let config_check = check_config_file();
    config_check.print();
    checks.push(config_check);
    let temp_check = check_temp_dir(settings);
    temp_check.print();
    checks.push(temp_check);

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    if errors > 0 {
        println!();
        Output::error(&format!("{} error(s) found. Please fix them before using Kort.", errors));
        std::process::exit(1);
    }

    let capabilities = Capabilities::probe(settings).await;
    let orchestrator = Orchestrator::with_capabilities(settings.clone(), &capabilities)?;

    println!();
    println!("{}", style("Active Methods").bold());
    Output::kv("Metadata", &orchestrator.metadata_strategies().join(" -> "));
    Output::kv("Transcript", &orchestrator.transcript_strategies().join(" -> "));

    println!();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();
    if warnings > 0 {
        Output::warning(&format!(
            "{} optional component(s) missing. Kort will skip the methods that need them.",
            warnings
        ));
    } else {
        Output::success("All checks passed! Every acquisition method is available.");
    }

    Ok(())
}

/// Probe an optional tool.
async fn check_tool(name: &str, hint: &str, feature: &str) -> CheckResult {
    match probe_tool(name).await {
        Ok(()) => CheckResult::ok(name, "available"),
        Err(e) => CheckResult::warning(name, &format!("{} (disables {})", e, feature), hint),
    }
}

/// The speech command has no version flag to call; it only has to start.
async fn check_speech_command(command: &str) -> CheckResult {
    match probe_command(command).await {
        Ok(()) => CheckResult::ok(command, "available"),
        Err(e) => CheckResult::warning(
            command,
            &format!("{} (disables audio transcription)", e),
            "Set transcription.speech_command to a program that takes an audio path and \
             prints {\"success\": bool, \"transcript\": \"...\"} on its last stdout line",
        ),
    }
}

/// The temp directory must be writable for audio downloads.
fn check_temp_dir(settings: &Settings) -> CheckResult {
    let temp_dir = settings.temp_dir();
    match std::fs::create_dir_all(&temp_dir) {
        Ok(()) => CheckResult::ok("Temp directory", &temp_dir.display().to_string()),
        Err(e) => CheckResult::error(
            "Temp directory",
            &format!("{} ({})", temp_dir.display(), e),
            "Set general.temp_dir to a writable location",
        ),
    }
}

/// Check if config file exists.
fn check_config_file() -> CheckResult {
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            &format!("Create one at {}", config_path.display()),
        )
    }
}

/// Platform-specific install hint for yt-dlp.
fn install_hint_ytdlp() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install yt-dlp"
    } else if cfg!(target_os = "linux") {
        "Install with: pip install yt-dlp (or your package manager)"
    } else {
        "Install from: https://github.com/yt-dlp/yt-dlp"
    }
}

/// Platform-specific install hint for ffmpeg.
fn install_hint_ffmpeg() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install ffmpeg"
    } else if cfg!(target_os = "linux") {
        "Install with: sudo apt install ffmpeg (or your package manager)"
    } else {
        "Install from: https://ffmpeg.org/download.html"
    }
}

fn install_hint_poppler() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install poppler"
    } else {
        "Install with: sudo apt install poppler-utils (or your package manager)"
    }
}

fn install_hint_browser() -> &'static str {
    "Install Chromium or Google Chrome, or edit acquisition.browser_engines"
}
