//! Video metadata acquisition.
//!
//! Strategies, in order: oEmbed lookup, watch page scrape, channel feed lookup and up
//! to two headless browser engines. A strategy counts as successful when it resolves a
//! title; every other field is optional and defaults to [`NOT_AVAILABLE`]. When all
//! strategies fail the record still carries the ID, thumbnails and per-strategy errors.

pub mod browser;
pub mod duration;
pub mod feed;
pub mod oembed;
pub mod scrape;

use crate::acquisition::browser::BrowserEngine;
use crate::acquisition::{http, Acquisition, ContentFetcher, Strategy, StrategyUsed};
use crate::config::Settings;
use crate::error::Result;
use crate::preflight::Capabilities;
use crate::source::SourceReference;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

pub use browser::BrowserMetadataStrategy;
pub use feed::FeedStrategy;
pub use oembed::OEmbedStrategy;
pub use scrape::PageScrapeStrategy;

/// Value of every field that could not be resolved.
pub const NOT_AVAILABLE: &str = "NOT AVAILABLE";

/// Source label used when every strategy failed.
pub const UNAVAILABLE_SOURCE: &str = "metadata_unavailable";

/// Whatever fields one strategy managed to resolve.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    /// Display form (`M:SS` or `H:MM:SS`).
    pub duration: Option<String>,
    pub view_count: Option<String>,
    /// `YYYY-MM-DD`.
    pub publish_date: Option<String>,
    pub description: Option<String>,
}

impl PartialMetadata {
    /// Title check shared by every metadata strategy.
    pub fn check_title(&self) -> std::result::Result<(), String> {
        match self.title.as_deref().map(str::trim) {
            None | Some("") => Err("no title resolved".to_string()),
            Some(t) if t.eq_ignore_ascii_case("youtube") => {
                Err("title is the site name, not the video".to_string())
            }
            Some(_) => Ok(()),
        }
    }
}

/// Trim, then drop empty strings.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Thumbnail URLs derived from the video ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thumbnails {
    pub default: String,
    pub medium: String,
    pub high: String,
    pub standard: String,
    pub maxres: String,
}

impl Thumbnails {
    pub fn for_video(video_id: &str) -> Self {
        let base = format!("https://i.ytimg.com/vi/{}", video_id);
        Self {
            default: format!("{}/default.jpg", base),
            medium: format!("{}/mqdefault.jpg", base),
            high: format!("{}/hqdefault.jpg", base),
            standard: format!("{}/sddefault.jpg", base),
            maxres: format!("{}/maxresdefault.jpg", base),
        }
    }
}

/// Complete metadata record. Missing fields hold [`NOT_AVAILABLE`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoMetadata {
    pub video_id: String,
    pub title: String,
    pub author: String,
    pub duration: String,
    pub view_count: String,
    pub publish_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub thumbnails: Thumbnails,
    /// Strategy that produced the record, or [`UNAVAILABLE_SOURCE`].
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<StrategyUsed>,
    /// Per-strategy error messages, keyed by strategy name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl VideoMetadata {
    /// Merge an acquisition result into a full record with per-field defaults.
    pub fn from_acquisition(source: &SourceReference, acquisition: Acquisition<PartialMetadata>) -> Self {
        let errors: BTreeMap<String, String> = acquisition
            .attempts()
            .iter()
            .map(|a| (a.strategy.clone(), a.error.clone()))
            .collect();

        let (partial, strategy, note) = match acquisition {
            Acquisition::Acquired { value, strategy, .. } => (value, Some(strategy), None),
            Acquisition::Exhausted { attempts, fallback } => {
                let names: Vec<&str> = attempts.iter().map(|a| a.strategy.as_str()).collect();
                let note = if names.is_empty() {
                    "No metadata strategies are available on this system.".to_string()
                } else {
                    format!(
                        "Attempted {} methods ({}). All failed; fields are marked {}.",
                        names.len(),
                        names.join(", "),
                        NOT_AVAILABLE
                    )
                };
                (fallback, None, Some(note))
            }
        };

        let or_na = |v: Option<String>| v.unwrap_or_else(|| NOT_AVAILABLE.to_string());
        let video_id = source.content_id.to_string();

        Self {
            thumbnails: Thumbnails::for_video(&video_id),
            source: strategy
                .as_ref()
                .map(|s| s.name.clone())
                .unwrap_or_else(|| UNAVAILABLE_SOURCE.to_string()),
            video_id,
            title: or_na(partial.title),
            author: or_na(partial.author),
            duration: or_na(partial.duration),
            view_count: or_na(partial.view_count),
            publish_date: or_na(partial.publish_date),
            description: partial.description,
            strategy,
            errors,
            note,
        }
    }

    /// Whether a real title was found.
    pub fn is_available(&self) -> bool {
        self.source != UNAVAILABLE_SOURCE
    }
}

/// Ordered metadata acquisition for a source.
pub struct MetadataAcquirer {
    fetcher: ContentFetcher<PartialMetadata>,
}

impl MetadataAcquirer {
    /// Build the strategy list; browser strategies only for engines that were found.
    pub fn new(settings: &Settings, capabilities: &Capabilities) -> Result<Self> {
        let client = http::create_client(&settings.acquisition)?;

        let mut strategies: Vec<Arc<dyn Strategy<PartialMetadata>>> = vec![
            Arc::new(OEmbedStrategy::new(client.clone())),
            Arc::new(PageScrapeStrategy::new(client.clone())),
            Arc::new(FeedStrategy::new(client)),
        ];

        let timeout = Duration::from_secs(settings.acquisition.browser_timeout_seconds);
        let names = ["browser-primary", "browser-secondary"];
        for (name, engine) in names.into_iter().zip(&capabilities.browsers) {
            let engine = BrowserEngine::new(engine.clone(), timeout)
                .with_user_agent(settings.acquisition.user_agent.clone());
            strategies.push(Arc::new(BrowserMetadataStrategy::new(name, engine)));
        }

        Ok(Self::with_strategies(strategies))
    }

    pub fn with_strategies(strategies: Vec<Arc<dyn Strategy<PartialMetadata>>>) -> Self {
        Self {
            fetcher: ContentFetcher::new("metadata", strategies),
        }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.fetcher.strategy_names()
    }

    /// Acquire metadata. Never fails; exhaustion yields a `NOT AVAILABLE` record.
    #[instrument(skip(self, source), fields(video_id = %source.content_id))]
    pub async fn acquire(&self, source: &SourceReference) -> VideoMetadata {
        let acquisition = self
            .fetcher
            .fetch(source, |_| PartialMetadata::default())
            .await;
        let metadata = VideoMetadata::from_acquisition(source, acquisition);
        info!("Metadata source: {} (title: {})", metadata.source, metadata.title);
        metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KortError;
    use async_trait::async_trait;

    struct Fixed {
        name: &'static str,
        result: std::result::Result<PartialMetadata, String>,
    }

    #[async_trait]
    impl Strategy<PartialMetadata> for Fixed {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn acquire(&self, _source: &SourceReference) -> Result<PartialMetadata> {
            self.result.clone().map_err(KortError::Scrape)
        }

        fn validate(&self, value: &PartialMetadata) -> std::result::Result<(), String> {
            value.check_title()
        }
    }

    fn source() -> SourceReference {
        SourceReference::parse("dQw4w9WgXcQ").unwrap()
    }

    #[tokio::test]
    async fn test_partial_fields_merge_with_defaults() {
        let acquirer = MetadataAcquirer::with_strategies(vec![
            Arc::new(Fixed { name: "oembed", result: Err("HTTP 401".into()) }),
            Arc::new(Fixed {
                name: "page-scrape",
                result: Ok(PartialMetadata {
                    title: Some("A talk".into()),
                    duration: Some("4:13".into()),
                    ..Default::default()
                }),
            }),
        ]);

        let metadata = acquirer.acquire(&source()).await;

        assert!(metadata.is_available());
        assert_eq!(metadata.title, "A talk");
        assert_eq!(metadata.duration, "4:13");
        assert_eq!(metadata.author, NOT_AVAILABLE);
        assert_eq!(metadata.source, "page-scrape");
        assert_eq!(metadata.strategy.as_ref().unwrap().position, 2);
        assert_eq!(metadata.errors.get("oembed").map(String::as_str), Some("Scrape error: HTTP 401"));
        assert!(metadata.note.is_none());
    }

    #[tokio::test]
    async fn test_titleless_result_falls_through() {
        let acquirer = MetadataAcquirer::with_strategies(vec![
            Arc::new(Fixed {
                name: "page-scrape",
                result: Ok(PartialMetadata { title: Some("YouTube".into()), ..Default::default() }),
            }),
            Arc::new(Fixed {
                name: "channel-feed",
                result: Ok(PartialMetadata { title: Some("Real title".into()), ..Default::default() }),
            }),
        ]);

        let metadata = acquirer.acquire(&source()).await;
        assert_eq!(metadata.title, "Real title");
        assert!(metadata.errors["page-scrape"].contains("site name"));
    }

    #[tokio::test]
    async fn test_all_strategies_fail_yields_not_available_record() {
        let acquirer = MetadataAcquirer::with_strategies(vec![
            Arc::new(Fixed { name: "oembed", result: Err("a".into()) }),
            Arc::new(Fixed { name: "page-scrape", result: Err("b".into()) }),
            Arc::new(Fixed { name: "channel-feed", result: Err("c".into()) }),
        ]);

        let metadata = acquirer.acquire(&source()).await;

        assert!(!metadata.is_available());
        assert_eq!(metadata.title, NOT_AVAILABLE);
        assert_eq!(metadata.publish_date, NOT_AVAILABLE);
        assert_eq!(metadata.errors.len(), 3);
        assert_eq!(metadata.source, UNAVAILABLE_SOURCE);
        assert!(metadata.note.unwrap().contains("oembed, page-scrape, channel-feed"));
        assert!(metadata.thumbnails.high.ends_with("/dQw4w9WgXcQ/hqdefault.jpg"));
    }

    #[test]
    fn test_serializes_camel_case() {
        let metadata = VideoMetadata::from_acquisition(
            &source(),
            Acquisition::Exhausted { attempts: Vec::new(), fallback: PartialMetadata::default() },
        );
        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["videoId"], "dQw4w9WgXcQ");
        assert_eq!(json["viewCount"], NOT_AVAILABLE);
        assert!(json.get("errors").is_none());
    }

    #[test]
    fn test_strategy_list_without_browsers() {
        let acquirer = MetadataAcquirer::new(&Settings::default(), &Capabilities::default()).unwrap();
        assert_eq!(acquirer.strategy_names(), vec!["oembed", "page-scrape", "channel-feed"]);

        let caps = Capabilities {
            browsers: vec!["chromium".into(), "google-chrome".into(), "brave".into()],
            ..Default::default()
        };
        let acquirer = MetadataAcquirer::new(&Settings::default(), &caps).unwrap();
        assert_eq!(acquirer.strategy_names().len(), 5);
    }
}
