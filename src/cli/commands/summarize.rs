//! Summarize command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::document::format_file_size;
use crate::orchestrator::Orchestrator;
use crate::preflight::{self, Operation};
use anyhow::Result;
use std::path::Path;

/// Run the summarize command.
pub async fn run_summarize(path: &str, lang: &str, settings: Settings) -> Result<()> {
    let path = Path::new(path);

    if let Err(e) = preflight::check(Operation::ProcessDocument, Some(path)).await {
        Output::error(&e.to_string());
        Output::info("Run 'kort doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings).await?;

    let spinner = Output::spinner(&format!("Summarizing {}...", path.display()));
    let result = orchestrator.process_document(path, lang).await;
    spinner.finish_and_clear();
    let result = result?;

    Output::header("Summary");
    Output::kv("Document", &path.display().to_string());
    Output::kv("Size", &format_file_size(result.info.file_size));
    if let Some(pages) = result.info.page_count {
        Output::kv("Pages", &pages.to_string());
    }
    for key in ["Title", "Author"] {
        if let Some(value) = result.info.metadata.get(key) {
            Output::kv(key, value);
        }
    }
    Output::kv("Characters", &result.text_chars.to_string());
    Output::kv("Language", &result.detected_language);
    println!("\n{}", result.summary);
    if result.translated_summary != result.summary {
        Output::header("Translated");
        println!("{}", result.translated_summary);
    }
    Ok(())
}
