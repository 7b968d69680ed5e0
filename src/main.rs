//! Kort CLI entry point.

use anyhow::Result;
use clap::Parser;
use kort::cli::{commands, Cli, Commands};
use kort::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("kort={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&Settings::expand_path(path)))?,
        None => Settings::load()?,
    };

    // Execute command
    match &cli.command {
        Commands::Process { source, lang, gpu, json } => {
            commands::run_process(source, lang, *gpu, *json, settings).await?;
        }

        Commands::Batch { sources, file, workers, lang, gpu, json } => {
            commands::run_batch(sources, file.as_deref(), *workers, lang, *gpu, *json, settings).await?;
        }

        Commands::Info { source, json } => {
            commands::run_info(source, *json, settings).await?;
        }

        Commands::Ask { question, from, lang } => {
            commands::run_ask(question, from, lang, settings).await?;
        }

        Commands::Suggest { from } => {
            commands::run_suggest(from, settings).await?;
        }

        Commands::Summarize { path, lang } => {
            commands::run_summarize(path, lang, settings).await?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings).await?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(host.clone(), *port, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, cli.config.as_deref(), settings)?;
        }
    }

    Ok(())
}
