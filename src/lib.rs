//! Kort - transcripts, summaries and answers for YouTube videos and documents
//!
//! The name "Kort" is Norwegian for "short."
//!
//! # Overview
//!
//! Kort allows you to:
//! - Fetch video metadata and transcripts through ordered fallback methods
//! - Summarize transcripts and documents extractively
//! - Translate summaries through an optional LibreTranslate server
//! - Ask questions about a transcript or document
//!
//! Every acquisition step tries its methods in priority order. When all of them fail the
//! result says so, with each method's error, instead of inventing content.
//!
//! # Architecture
//!
//! - `acquisition` - Ordered fallback over strategies, shared HTTP and browser helpers
//! - `metadata` - Video metadata strategies (oEmbed, page scrape, channel feed, browser)
//! - `transcript` - Transcript strategies (captions, audio transcription, browser)
//! - `audio` - Audio download and probing
//! - `chunking` - Sentence-aligned overlapping chunks
//! - `summarize` - Extractive summarization
//! - `qa` - Context selection and extractive answers
//! - `translate` - Language detection and translation
//! - `document` - Text extraction from local files
//! - `preflight` - External tool probing
//! - `orchestrator` - Pipeline coordination and batch processing
//!
//! # Example
//!
//! ```rust,no_run
//! use kort::config::Settings;
//! use kort::orchestrator::{Orchestrator, ProcessRequest};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings).await?;
//!
//!     let outcome = orchestrator.process_single(ProcessRequest::new("dQw4w9WgXcQ")).await;
//!     println!("{}", outcome.summary);
//!
//!     Ok(())
//! }
//! ```

pub mod acquisition;
pub mod audio;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod metadata;
pub mod orchestrator;
pub mod preflight;
pub mod qa;
pub mod source;
pub mod summarize;
pub mod text;
pub mod transcript;
pub mod translate;

#[cfg(all(test, unix))]
pub(crate) mod testing;

pub use error::{KortError, Result};
