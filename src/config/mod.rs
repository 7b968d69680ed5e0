//! Configuration module for Kort.
//!
//! Handles loading and managing application settings.

mod settings;

pub use settings::{
    AcquisitionSettings, BatchSettings, GeneralSettings, QaSettings, ServerSettings, Settings,
    SummarizationSettings, TranscriptionSettings, TranslationSettings, MAX_BATCH_WORKERS,
};
