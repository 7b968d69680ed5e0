//! Ask and suggest command implementations.

use crate::cli::Output;
use crate::config::Settings;
use crate::document;
use crate::orchestrator::{AskRequest, Orchestrator};
use crate::preflight::{self, Operation};
use crate::transcript::Transcript;
use anyhow::Result;
use console::style;
use std::path::Path;

/// Run the ask command.
pub async fn run_ask(question: &str, from: &str, lang: &str, settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings).await?;
    let document = load_document(&orchestrator, from).await?;

    let spinner = Output::spinner("Looking for an answer...");
    let result = orchestrator
        .ask(AskRequest {
            document,
            question: question.to_string(),
            target_language: lang.to_string(),
        })
        .await;
    spinner.finish_and_clear();
    let result = result?;

    println!("\n{}\n", result.answer);
    Output::kv("Confidence", &format!("{:.2}", result.confidence));
    Output::kv("Context", &result.context);
    Ok(())
}

/// Run the suggest command.
pub async fn run_suggest(from: &str, settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings).await?;
    let document = load_document(&orchestrator, from).await?;

    Output::header("Suggested questions");
    for question in orchestrator.suggest_questions(&document) {
        Output::list_item(&question);
    }
    Ok(())
}

/// Text of a local document, or the transcript of a video.
async fn load_document(orchestrator: &Orchestrator, from: &str) -> Result<String> {
    let path = Path::new(from);
    if path.exists() {
        if let Err(e) = preflight::check(Operation::ProcessDocument, Some(path)).await {
            Output::error(&e.to_string());
            Output::info("Run 'kort doctor' for detailed diagnostics.");
            return Err(e.into());
        }
        return Ok(document::extract_text(path).await?);
    }

    let spinner = Output::spinner("Acquiring transcript...");
    let transcript = orchestrator.transcript(from).await;
    spinner.finish_and_clear();

    let transcript = transcript?;
    if let Transcript::Available { strategy, .. } = &transcript {
        println!("{}", style(format!("Transcript via {}", strategy.name)).dim());
    }
    Ok(transcript.into_text(from)?)
}
