//! CLI module for Kort.

pub mod commands;
mod output;

pub use output::Output;

use crate::translate;
use clap::{Parser, Subcommand};

/// Accept only supported language codes for `--lang`.
fn parse_language(code: &str) -> Result<String, String> {
    translate::check_language(code)
        .map(|()| code.to_string())
        .map_err(|e| e.to_string())
}

/// Kort - transcripts, summaries and answers for YouTube videos and documents
///
/// Acquires a transcript through a chain of fallback methods, summarizes it extractively,
/// and answers questions about it. The name "Kort" is Norwegian for "short."
#[derive(Parser, Debug)]
#[command(name = "kort")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "KORT_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch metadata and transcript for a video, then summarize it
    Process {
        /// YouTube URL or 11-character video ID
        source: String,

        /// Target language for the summary (auto, en, es, ...)
        #[arg(short, long, default_value = "auto", value_parser = parse_language)]
        lang: String,

        /// Prefer GPU for local speech models
        #[arg(long)]
        gpu: bool,

        /// Print the full outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Process several videos concurrently
    Batch {
        /// YouTube URLs or video IDs
        sources: Vec<String>,

        /// File with one URL or ID per line
        #[arg(short, long)]
        file: Option<String>,

        /// Number of videos processed at once (1-20)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Target language for the summaries
        #[arg(short, long, default_value = "auto", value_parser = parse_language)]
        lang: String,

        /// Prefer GPU for local speech models
        #[arg(long)]
        gpu: bool,

        /// Print the full outcomes as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show video metadata
    Info {
        /// YouTube URL or video ID
        source: String,

        /// Print the metadata as JSON
        #[arg(long)]
        json: bool,
    },

    /// Ask a question about a video transcript or a document
    Ask {
        /// The question to ask
        question: String,

        /// Document path (.txt, .md, .pdf) or YouTube URL/ID to ask about
        #[arg(short, long)]
        from: String,

        /// Language of the answer
        #[arg(short, long, default_value = "en", value_parser = parse_language)]
        lang: String,
    },

    /// Suggest questions for a video transcript or a document
    Suggest {
        /// Document path (.txt, .md, .pdf) or YouTube URL/ID
        from: String,
    },

    /// Summarize a local text, Markdown or PDF document
    Summarize {
        /// Path to the document
        path: String,

        /// Target language for the summary
        #[arg(short, long, default_value = "auto", value_parser = parse_language)]
        lang: String,
    },

    /// Check external tools and show which acquisition methods are active
    Doctor,

    /// Start HTTP API server for integration with other systems
    Serve {
        /// Host to bind to (defaults to the configured host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to the configured port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_batch() {
        let cli = Cli::try_parse_from([
            "kort", "-vv", "batch", "aaaaaaaaaaa", "bbbbbbbbbbb", "--workers", "2", "--lang", "es",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Batch { sources, workers, lang, .. } => {
                assert_eq!(sources.len(), 2);
                assert_eq!(workers, Some(2));
                assert_eq!(lang, "es");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_lang_must_be_supported() {
        assert!(Cli::try_parse_from(["kort", "process", "aaaaaaaaaaa", "--lang", "fr"]).is_ok());
        assert!(Cli::try_parse_from(["kort", "process", "aaaaaaaaaaa", "--lang", "xx"]).is_err());
        assert!(Cli::try_parse_from(["kort", "summarize", "notes.md", "-l", "tlh"]).is_err());
    }

    #[test]
    fn test_ask_requires_source() {
        assert!(Cli::try_parse_from(["kort", "ask", "What is this?"]).is_err());
        assert!(Cli::try_parse_from(["kort", "ask", "What is this?", "--from", "notes.md"]).is_ok());
    }
}
