//! Process and batch command implementations.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::{BatchRequest, Orchestrator, ProcessRequest};
use anyhow::{Context, Result};

/// Run the process command.
pub async fn run_process(source: &str, lang: &str, gpu: bool, json: bool, settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings).await?;

    let spinner = Output::spinner(&format!("Processing {}...", source));
    let outcome = orchestrator
        .process_single(ProcessRequest {
            source_reference: source.to_string(),
            target_language: lang.to_string(),
            use_gpu: gpu,
        })
        .await;
    spinner.finish_and_clear();

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        Output::outcome(&outcome);
    }

    if let Some(error) = outcome.error {
        anyhow::bail!(error);
    }
    Ok(())
}

/// Run the batch command.
pub async fn run_batch(
    sources: &[String],
    file: Option<&str>,
    workers: Option<usize>,
    lang: &str,
    gpu: bool,
    json: bool,
    settings: Settings,
) -> Result<()> {
    let mut references = sources.to_vec();
    if let Some(path) = file {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read source list {}", path))?;
        references.extend(read_source_list(&content));
    }

    if references.is_empty() {
        Output::error("No sources given. Pass URLs as arguments or use --file.");
        anyhow::bail!("no sources given");
    }

    let orchestrator = Orchestrator::new(settings).await?;

    let spinner = Output::spinner(&format!("Processing {} videos...", references.len()));
    let result = orchestrator
        .process_batch(BatchRequest {
            source_references: references,
            target_language: lang.to_string(),
            use_gpu: gpu,
            max_workers: workers,
        })
        .await?;
    spinner.finish_and_clear();

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    for outcome in &result.outcomes {
        Output::outcome(outcome);
    }

    Output::header("Batch summary");
    Output::kv("Total", &result.counts.total.to_string());
    Output::kv("Succeeded", &result.counts.succeeded.to_string());
    Output::kv("No transcript", &result.counts.unavailable.to_string());
    Output::kv("Failed", &result.counts.failed.to_string());

    if result.counts.failed > 0 {
        Output::warning(&format!("{} video(s) failed", result.counts.failed));
    } else {
        Output::success("Batch complete");
    }
    Ok(())
}

/// One reference per line; blank lines and `#` comments are skipped.
fn read_source_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
