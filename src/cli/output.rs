//! CLI output formatting utilities.

use crate::metadata::VideoMetadata;
use crate::orchestrator::{OutcomeStatus, ProcessingOutcome};
use crate::text::truncate_chars;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print a metadata record.
    pub fn metadata(metadata: &VideoMetadata) {
        println!("  {} ({})", style(&metadata.title).bold(), style(&metadata.video_id).dim());
        Self::kv("Author", &metadata.author);
        Self::kv("Duration", &metadata.duration);
        Self::kv("Views", &metadata.view_count);
        Self::kv("Published", &metadata.publish_date);
        Self::kv("Source", &metadata.source);
        if let Some(note) = &metadata.note {
            Self::kv("Note", note);
        }
        for (strategy, error) in &metadata.errors {
            println!("    {} {}: {}", style("-").dim(), strategy, style(error).dim());
        }
    }

    /// Print one processing outcome.
    pub fn outcome(outcome: &ProcessingOutcome) {
        let (marker, label) = match outcome.status() {
            OutcomeStatus::Succeeded => (style("✓").green(), "done"),
            OutcomeStatus::Unavailable => (style("!").yellow(), "no transcript"),
            OutcomeStatus::Failed => (style("✗").red(), "failed"),
        };
        let title = outcome
            .metadata
            .as_ref()
            .filter(|m| m.is_available())
            .map(|m| m.title.as_str())
            .unwrap_or(&outcome.source_reference);
        println!("\n{} {} ({})", marker, style(title).bold(), label);

        if let Some(error) = &outcome.error {
            Self::kv("Error", error);
            return;
        }

        if let Some(source) = &outcome.transcript_source {
            if let Some(strategy) = &source.strategy {
                Self::kv(
                    "Transcript",
                    &format!("{} (method {})", strategy.name, strategy.position),
                );
            }
            for attempt in &source.attempts {
                println!(
                    "    {} {}: {}",
                    style("-").dim(),
                    attempt.strategy,
                    style(&attempt.error).dim()
                );
            }
        }
        if !outcome.detected_language.is_empty() {
            Self::kv("Language", &outcome.detected_language);
        }
        if let Some(note) = &outcome.note {
            Self::kv("Note", note);
        }
        if !outcome.summary.is_empty() {
            println!("\n{}", outcome.summary);
            if outcome.translated_summary != outcome.summary {
                println!("\n{}", style(&outcome.translated_summary).italic());
            }
        }
    }

    /// Create a progress bar.
    pub fn progress_bar(len: u64, msg: &str) -> ProgressBar {
        let pb = ProgressBar::new(len);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );
        pb.set_message(msg.to_string());
        pb
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap(),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Single-line preview of `content`, cut at `max_chars`.
pub fn content_preview(content: &str, max_chars: usize) -> String {
    let content = content.replace('\n', " ");
    if content.chars().count() <= max_chars {
        content
    } else {
        format!("{}...", truncate_chars(&content, max_chars))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_preview() {
        assert_eq!(content_preview("a\nb", 10), "a b");
        assert_eq!(content_preview("héllo wörld", 5), "héllo...");
    }
}
