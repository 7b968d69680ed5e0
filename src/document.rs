//! Text extraction from local documents.
//!
//! Plain text and Markdown are read directly. PDFs go through poppler: `pdftotext` for the
//! text and `pdfinfo` for the page count and document metadata.

use crate::error::{KortError, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{info, instrument};

/// Documents larger than this are rejected.
pub const MAX_DOCUMENT_BYTES: u64 = 10 * 1024 * 1024;
/// Extracted text must be longer than this to be useful.
pub const MIN_EXTRACTED_CHARS: usize = 50;

const POPPLER_TIMEOUT: Duration = Duration::from_secs(60);

/// Kinds of documents that can be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Text,
    Pdf,
}

impl DocumentKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "txt" | "md" | "markdown" | "text" => Some(Self::Text),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }
}

/// File-level facts about a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentInfo {
    pub kind: DocumentKind,
    pub file_size: u64,
    /// Only known for PDFs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<usize>,
    /// PDF info dictionary fields (Title, Author, Producer, ...).
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

/// Extracted text plus file facts.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub text: String,
    pub info: DocumentInfo,
}

/// Extract the text of a `.txt`, `.md` or `.pdf` file.
pub async fn extract_text(path: &Path) -> Result<String> {
    Ok(read_document(path).await?.text)
}

/// Read a document, returning its trimmed text and file facts.
///
/// PDFs are checked with `pdfinfo` first; one it cannot parse is rejected as invalid input.
#[instrument(skip(path), fields(path = %path.display()))]
pub async fn read_document(path: &Path) -> Result<ExtractedDocument> {
    let kind = DocumentKind::from_path(path).ok_or_else(|| {
        KortError::InvalidInput(format!("Unsupported document type: {}", path.display()))
    })?;

    let file_size = tokio::fs::metadata(path)
        .await
        .map_err(|_| KortError::InvalidInput(format!("File not found: {}", path.display())))?
        .len();
    if file_size > MAX_DOCUMENT_BYTES {
        return Err(KortError::InvalidInput(format!(
            "Document too large ({} bytes, maximum {} MB)",
            file_size,
            MAX_DOCUMENT_BYTES / 1024 / 1024
        )));
    }

    let (text, page_count, metadata) = match kind {
        DocumentKind::Text => (tokio::fs::read_to_string(path).await?, None, BTreeMap::new()),
        DocumentKind::Pdf => {
            let (pages, metadata) = parse_pdfinfo(&pdf_info(path).await?);
            (pdf_to_text(path).await?, pages, metadata)
        }
    };

    let text = text.trim().to_string();
    if text.chars().count() <= MIN_EXTRACTED_CHARS {
        return Err(KortError::Validation(format!(
            "Not enough text extracted from {}",
            path.display()
        )));
    }

    info!(
        "Extracted {} chars ({} bytes, {} pages)",
        text.chars().count(),
        file_size,
        page_count.map_or_else(|| "-".to_string(), |p| p.to_string())
    );
    Ok(ExtractedDocument {
        text,
        info: DocumentInfo {
            kind,
            file_size,
            page_count,
            metadata,
        },
    })
}

async fn pdf_to_text(path: &Path) -> Result<String> {
    let mut cmd = Command::new("pdftotext");
    cmd.arg("-layout").arg(path).arg("-");
    run_poppler("pdftotext", cmd).await
}

async fn pdf_info(path: &Path) -> Result<String> {
    let mut cmd = Command::new("pdfinfo");
    cmd.arg(path);
    run_poppler("pdfinfo", cmd).await.map_err(|e| match e {
        KortError::ToolFailed(msg) => KortError::InvalidInput(format!("Invalid PDF file: {}", msg)),
        other => other,
    })
}

/// Run a poppler tool under the shared deadline and return its stdout.
async fn run_poppler(tool: &str, mut cmd: Command) -> Result<String> {
    let child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| KortError::from_spawn(tool, e))?;

    let output = tokio::time::timeout(POPPLER_TIMEOUT, child.wait_with_output())
        .await
        .map_err(|_| KortError::Timeout {
            operation: tool.to_string(),
            seconds: POPPLER_TIMEOUT.as_secs(),
        })??;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(KortError::ToolFailed(format!("{}: {}", tool, stderr.trim())));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Human-readable size with binary units, e.g. `1.5 KB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let formatted = format!("{:.2}", value);
    let formatted = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", formatted, UNITS[unit])
}

/// Split `pdfinfo` output into the page count and the remaining non-empty fields.
fn parse_pdfinfo(output: &str) -> (Option<usize>, BTreeMap<String, String>) {
    let mut pages = None;
    let mut metadata = BTreeMap::new();

    for line in output.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let (key, value) = (key.trim(), value.trim());
        if key == "Pages" {
            pages = value.parse().ok();
        } else if !key.is_empty() && !value.is_empty() {
            metadata.insert(key.to_string(), value.to_string());
        }
    }
    (pages, metadata)
}
