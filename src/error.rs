//! Error types for Kort.

use crate::acquisition::Attempt;
use thiserror::Error;

/// Library-level error type for Kort operations.
#[derive(Error, Debug)]
pub enum KortError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Every strategy in an ordered fallback list failed.
    #[error("All {} acquisition strategies failed for {target}", attempts.len())]
    Acquisition {
        target: String,
        attempts: Vec<Attempt>,
    },

    #[error("{0}")]
    Validation(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Timed out after {seconds}s: {operation}")]
    Timeout { operation: String, seconds: u64 },

    #[error("Scrape error: {0}")]
    Scrape(String),

    #[error("Audio download failed: {0}")]
    AudioDownload(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl KortError {
    /// Maps a process spawn error, distinguishing a missing binary from other IO failures.
    pub fn from_spawn(tool: &str, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            KortError::ToolNotFound(tool.to_string())
        } else {
            KortError::ToolFailed(format!("{}: {}", tool, err))
        }
    }
}

/// Result type alias for Kort operations.
pub type Result<T> = std::result::Result<T, KortError>;
