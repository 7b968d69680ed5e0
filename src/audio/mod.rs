//! Audio download and inspection.

pub mod downloader;

pub use downloader::{download_audio, file_size, probe_duration};
