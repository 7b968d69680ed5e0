//! Pipeline orchestrator for Kort.
//!
//! Sequences metadata, transcript, summary and translation for one source, and fans a
//! batch out across a bounded number of concurrent tasks.

use crate::config::Settings;
use crate::document::{self, DocumentInfo};
use crate::error::{KortError, Result};
use crate::metadata::{MetadataAcquirer, VideoMetadata};
use crate::preflight::Capabilities;
use crate::qa::{suggest_questions, QaResult, QuestionAnswerer};
use crate::source::SourceReference;
use crate::summarize::ExtractiveSummarizer;
use crate::text::truncate_chars;
use crate::transcript::{Transcript, TranscriptAcquirer, TranscriptSource};
use crate::translate::{check_language, Translator, AUTO, DEFAULT_LANGUAGE};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Chars of the transcript echoed back in an outcome.
pub const SNIPPET_CHARS: usize = 500;

/// Note attached to outcomes whose transcript is a property-based placeholder.
pub const PLACEHOLDER_NOTE: &str =
    "Transcript is a placeholder derived from audio properties, not speech recognition.";

/// Note attached to outcomes whose transcript could not be acquired.
pub const SKIPPED_NOTE: &str =
    "Transcript not available, so no summary or translation was produced.";

fn default_target_language() -> String {
    AUTO.to_string()
}

/// Request to process one source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    pub source_reference: String,
    #[serde(default = "default_target_language")]
    pub target_language: String,
    /// Hint for local model backends. The extractive pipeline runs on CPU either way.
    #[serde(default)]
    pub use_gpu: bool,
}

impl ProcessRequest {
    pub fn new(source_reference: impl Into<String>) -> Self {
        Self {
            source_reference: source_reference.into(),
            target_language: default_target_language(),
            use_gpu: false,
        }
    }
}

/// Request to process many sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    pub source_references: Vec<String>,
    #[serde(default = "default_target_language")]
    pub target_language: String,
    #[serde(default)]
    pub use_gpu: bool,
    /// Concurrent items. Falls back to the configured default and is clamped to `1..=20`.
    #[serde(default)]
    pub max_workers: Option<usize>,
}

/// Request to answer a question about a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskRequest {
    pub document: String,
    pub question: String,
    #[serde(default = "default_target_language")]
    pub target_language: String,
}

/// Result of processing one source. Always populated, even on failure.
///
/// Text fields are empty strings when they were not produced. A failed outcome keeps
/// only the metadata and the transcript provenance.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingOutcome {
    pub source_reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<VideoMetadata>,
    /// Full transcript, or the unavailable message.
    pub transcript: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript_source: Option<TranscriptSource>,
    pub transcript_snippet: String,
    pub summary: String,
    pub translated_summary: String,
    pub detected_language: String,
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Coarse classification of an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    Succeeded,
    Unavailable,
    Failed,
}

impl ProcessingOutcome {
    fn empty(source_reference: &str) -> Self {
        Self {
            source_reference: source_reference.to_string(),
            video_id: None,
            metadata: None,
            transcript: String::new(),
            transcript_source: None,
            transcript_snippet: String::new(),
            summary: String::new(),
            translated_summary: String::new(),
            detected_language: String::new(),
            error: None,
            note: None,
        }
    }

    /// An outcome carrying only an error.
    pub fn failed(source_reference: &str, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::empty(source_reference)
        }
    }

    pub fn status(&self) -> OutcomeStatus {
        if self.error.is_some() {
            OutcomeStatus::Failed
        } else if self.transcript_source.as_ref().is_some_and(|s| s.available) {
            OutcomeStatus::Succeeded
        } else {
            OutcomeStatus::Unavailable
        }
    }
}

/// Aggregate counts for a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCounts {
    pub total: usize,
    pub succeeded: usize,
    pub unavailable: usize,
    pub failed: usize,
}

impl BatchCounts {
    pub fn tally(outcomes: &[ProcessingOutcome]) -> Self {
        outcomes.iter().fold(
            Self {
                total: outcomes.len(),
                ..Self::default()
            },
            |mut counts, outcome| {
                match outcome.status() {
                    OutcomeStatus::Succeeded => counts.succeeded += 1,
                    OutcomeStatus::Unavailable => counts.unavailable += 1,
                    OutcomeStatus::Failed => counts.failed += 1,
                }
                counts
            },
        )
    }
}

/// Outcomes of a batch, in input order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    pub outcomes: Vec<ProcessingOutcome>,
    pub counts: BatchCounts,
}

/// Summary of a local document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub path: PathBuf,
    /// Kind, file size, and for PDFs the page count and info fields.
    #[serde(flatten)]
    pub info: DocumentInfo,
    pub text_chars: usize,
    pub summary: String,
    pub translated_summary: String,
    pub detected_language: String,
}

/// A summary with its detected language and translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResult {
    pub summary: String,
    pub translated_summary: String,
    pub detected_language: String,
}

/// The main orchestrator for the Kort pipeline.
///
/// Cheap to clone; every service is shared read-only behind an `Arc`.
#[derive(Clone)]
pub struct Orchestrator {
    settings: Arc<Settings>,
    metadata: Arc<MetadataAcquirer>,
    transcripts: Arc<TranscriptAcquirer>,
    summarizer: Arc<ExtractiveSummarizer>,
    qa: Arc<QuestionAnswerer>,
    translator: Arc<Translator>,
}

impl Orchestrator {
    /// Probe the machine for optional tools and build every service from `settings`.
    pub async fn new(settings: Settings) -> Result<Self> {
        let capabilities = Capabilities::probe(&settings).await;
        Self::with_capabilities(settings, &capabilities)
    }

    /// Build with an already-probed capability set.
    pub fn with_capabilities(settings: Settings, capabilities: &Capabilities) -> Result<Self> {
        std::fs::create_dir_all(settings.temp_dir())?;

        let metadata = MetadataAcquirer::new(&settings, capabilities)?;
        let transcripts = TranscriptAcquirer::new(&settings, capabilities)?;
        let translator = Translator::new(&settings.translation, &settings.acquisition)?;

        info!("Metadata strategies: {}", metadata.strategy_names().join(" -> "));
        info!("Transcript strategies: {}", transcripts.strategy_names().join(" -> "));

        Ok(Self::with_components(settings, metadata, transcripts, translator))
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        metadata: MetadataAcquirer,
        transcripts: TranscriptAcquirer,
        translator: Translator,
    ) -> Self {
        Self {
            summarizer: Arc::new(ExtractiveSummarizer::new(&settings.summarization)),
            qa: Arc::new(QuestionAnswerer::new(&settings.qa)),
            settings: Arc::new(settings),
            metadata: Arc::new(metadata),
            transcripts: Arc::new(transcripts),
            translator: Arc::new(translator),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn metadata_strategies(&self) -> Vec<&'static str> {
        self.metadata.strategy_names()
    }

    pub fn transcript_strategies(&self) -> Vec<&'static str> {
        self.transcripts.strategy_names()
    }

    /// Fetch metadata only.
    pub async fn video_info(&self, source_reference: &str) -> Result<VideoMetadata> {
        let source = SourceReference::parse(source_reference)?;
        Ok(self.metadata.acquire(&source).await)
    }

    /// Acquire only the transcript of a source, skipping metadata and summarization.
    pub async fn transcript(&self, source_reference: &str) -> Result<Transcript> {
        let source = SourceReference::parse(source_reference)?;
        Ok(self.transcripts.acquire(&source).await)
    }

    /// Process one source. Never fails; problems are reported in the outcome.
    #[instrument(skip(self, request), fields(source = %request.source_reference))]
    pub async fn process_single(&self, request: ProcessRequest) -> ProcessingOutcome {
        let raw = request.source_reference.as_str();
        let source = match SourceReference::parse(raw) {
            Ok(source) => source,
            Err(e) => {
                warn!("Rejected source {}: {}", raw, e);
                return ProcessingOutcome::failed(raw, e.to_string());
            }
        };
        if let Err(e) = check_language(&request.target_language) {
            warn!("Rejected target language for {}: {}", raw, e);
            return ProcessingOutcome {
                video_id: Some(source.content_id.to_string()),
                ..ProcessingOutcome::failed(raw, e.to_string())
            };
        }
        if request.use_gpu {
            debug!("GPU requested; extractive stages ignore it");
        }

        let mut outcome = ProcessingOutcome {
            video_id: Some(source.content_id.to_string()),
            ..ProcessingOutcome::empty(raw)
        };

        let metadata = self.metadata.acquire(&source).await;
        outcome.metadata = Some(metadata);

        let (text, provenance) = self.transcripts.acquire(&source).await.into_parts();
        if !provenance.available {
            info!("Skipping summary for {}: transcript unavailable", source.content_id);
            outcome.note = Some(SKIPPED_NOTE.to_string());
            outcome.transcript = text;
            outcome.transcript_source = Some(provenance);
            return outcome;
        }
        if provenance.placeholder {
            outcome.note = Some(PLACEHOLDER_NOTE.to_string());
        }
        outcome.transcript_source = Some(provenance);

        match self.summarize_text(&text, &request.target_language).await {
            Ok(result) => {
                outcome.transcript_snippet = snippet(&text);
                outcome.transcript = text;
                outcome.summary = result.summary;
                outcome.translated_summary = result.translated_summary;
                outcome.detected_language = result.detected_language;
            }
            Err(e) => {
                warn!("Summarization failed for {}: {}", source.content_id, e);
                outcome.error = Some(e.to_string());
            }
        }
        outcome
    }

    /// Process many sources with bounded parallelism. Output order matches input order.
    ///
    /// Items run in groups of `max_workers`; the next group starts once the previous one
    /// has fully settled. A task that panics becomes a failed outcome.
    #[instrument(skip_all, fields(items = request.source_references.len()))]
    pub async fn process_batch(&self, request: BatchRequest) -> Result<BatchOutcome> {
        if request.source_references.is_empty() {
            return Err(KortError::Validation(
                "At least one source reference is required".to_string(),
            ));
        }
        check_language(&request.target_language)?;

        let workers = Settings::clamp_workers(
            request.max_workers.unwrap_or(self.settings.batch.max_workers),
        );
        info!(
            "Processing {} items with {} workers",
            request.source_references.len(),
            workers
        );

        let mut outcomes = Vec::with_capacity(request.source_references.len());

        for (group_index, group) in request.source_references.chunks(workers).enumerate() {
            debug!("Starting group {} ({} items)", group_index + 1, group.len());

            let handles = group.iter().map(|raw| {
                let this = self.clone();
                let item = ProcessRequest {
                    source_reference: raw.clone(),
                    target_language: request.target_language.clone(),
                    use_gpu: request.use_gpu,
                };
                tokio::spawn(async move { this.process_single(item).await })
            });

            let settled = join_all(handles).await;
            for (raw, result) in group.iter().zip(settled) {
                outcomes.push(result.unwrap_or_else(|e| {
                    warn!("Task for {} did not complete: {}", raw, e);
                    ProcessingOutcome::failed(raw, format!("Processing task failed: {}", e))
                }));
            }
        }

        let counts = BatchCounts::tally(&outcomes);
        info!(
            "Batch done: {} succeeded, {} unavailable, {} failed",
            counts.succeeded, counts.unavailable, counts.failed
        );
        Ok(BatchOutcome { outcomes, counts })
    }

    /// Summarize `text`, detect the summary's language and translate it as requested.
    ///
    /// `auto` translates non-English summaries to English, `en` leaves the summary as is,
    /// and any other code translates from the detected language.
    pub async fn summarize_text(&self, text: &str, target_language: &str) -> Result<SummaryResult> {
        let summary = self.summarizer.summarize(text)?;
        let detected = self.translator.detect_language(&summary).await;

        let translated = match target_language {
            "" | AUTO if detected != DEFAULT_LANGUAGE => {
                self.translator
                    .translate(&summary, &detected, DEFAULT_LANGUAGE)
                    .await
            }
            "" | AUTO | DEFAULT_LANGUAGE => summary.clone(),
            target => self.translator.translate(&summary, &detected, target).await,
        };

        Ok(SummaryResult {
            summary,
            translated_summary: translated,
            detected_language: detected,
        })
    }

    /// Answer a question about `document`.
    ///
    /// Non-English questions are translated to English first, and the answer is
    /// translated into `target_language` unless that is English or `auto`.
    #[instrument(skip_all)]
    pub async fn ask(&self, request: AskRequest) -> Result<QaResult> {
        if request.document.trim().is_empty() || request.question.trim().is_empty() {
            return Err(KortError::Validation(
                "Both document and question are required".to_string(),
            ));
        }
        check_language(&request.target_language)?;

        let question_language = self.translator.detect_language(&request.question).await;
        let question = if question_language != DEFAULT_LANGUAGE {
            debug!("Question language: {}", question_language);
            self.translator
                .translate(&request.question, &question_language, DEFAULT_LANGUAGE)
                .await
        } else {
            request.question.clone()
        };

        let mut result = self.qa.ask(&request.document, &question)?;

        if request.target_language != DEFAULT_LANGUAGE {
            result.answer = self
                .translator
                .translate(&result.answer, DEFAULT_LANGUAGE, &request.target_language)
                .await;
        }
        Ok(result)
    }

    /// Rule-based follow-up questions for `document`.
    pub fn suggest_questions(&self, document: &str) -> Vec<String> {
        suggest_questions(document)
    }

    /// Extract and summarize a local text, Markdown or PDF document.
    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub async fn process_document(&self, path: &Path, target_language: &str) -> Result<DocumentSummary> {
        check_language(target_language)?;
        let document = document::read_document(path).await?;
        let result = self.summarize_text(&document.text, target_language).await?;

        Ok(DocumentSummary {
            path: path.to_path_buf(),
            info: document.info,
            text_chars: document.text.chars().count(),
            summary: result.summary,
            translated_summary: result.translated_summary,
            detected_language: result.detected_language,
        })
    }
}

fn snippet(text: &str) -> String {
    if text.chars().count() > SNIPPET_CHARS {
        format!("{}...", truncate_chars(text, SNIPPET_CHARS))
    } else {
        text.to_string()
    }
}
