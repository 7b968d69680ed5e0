//! Info command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the info command.
pub async fn run_info(source: &str, json: bool, settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings).await?;

    let spinner = Output::spinner("Fetching metadata...");
    let metadata = orchestrator.video_info(source).await;
    spinner.finish_and_clear();
    let metadata = metadata?;

    if json {
        println!("{}", serde_json::to_string_pretty(&metadata)?);
    } else {
        Output::header("Video");
        Output::metadata(&metadata);
        if !metadata.is_available() {
            Output::warning("No metadata method succeeded.");
        }
    }
    Ok(())
}
