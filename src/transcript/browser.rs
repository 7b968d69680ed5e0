//! Transcript scraping from a rendered watch page.

use super::check_length;
use crate::acquisition::browser::BrowserEngine;
use crate::acquisition::Strategy;
use crate::error::{KortError, Result};
use crate::source::SourceReference;
use async_trait::async_trait;
use scraper::{Html, Selector};

/// Transcript panel selectors, tried in order.
const SEGMENT_SELECTORS: &[&str] = &[
    "ytd-transcript-segment-renderer .segment-text",
    ".ytd-transcript-segment-renderer .segment-text",
    ".transcript-text",
    ".caption-line",
];

pub struct BrowserTranscriptStrategy {
    engine: BrowserEngine,
    min_chars: usize,
}

impl BrowserTranscriptStrategy {
    pub fn new(engine: BrowserEngine, min_chars: usize) -> Self {
        Self { engine, min_chars }
    }
}

#[async_trait]
impl Strategy<String> for BrowserTranscriptStrategy {
    fn name(&self) -> &'static str {
        "browser-transcript"
    }

    async fn acquire(&self, source: &SourceReference) -> Result<String> {
        let dom = self.engine.dump_dom(&source.url).await?;
        extract_segments(&dom)
            .ok_or_else(|| KortError::Scrape("No transcript segments in rendered page".into()))
    }

    fn validate(&self, value: &String) -> std::result::Result<(), String> {
        check_length(value, self.min_chars)
    }
}

/// Text of the first selector that matches anything, segments joined by spaces.
fn extract_segments(dom: &str) -> Option<String> {
    let doc = Html::parse_document(dom);

    SEGMENT_SELECTORS.iter().find_map(|sel| {
        let selector = Selector::parse(sel).ok()?;
        let segments: Vec<String> = doc
            .select(&selector)
            .map(|el| el.text().collect::<Vec<_>>().join(" "))
            .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|t| !t.is_empty())
            .collect();

        (!segments.is_empty()).then(|| segments.join(" "))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_segments() {
        let dom = r#"<html><body>
            <ytd-transcript-segment-renderer><div class="segment-text"> First   line </div></ytd-transcript-segment-renderer>
            <ytd-transcript-segment-renderer><div class="segment-text">Second line</div></ytd-transcript-segment-renderer>
            <div class="caption-line">ignored</div>
        </body></html>"#;
        assert_eq!(extract_segments(dom).as_deref(), Some("First line Second line"));
    }

    #[test]
    fn test_extract_segments_falls_through_selectors() {
        let dom = r#"<div class="caption-line">only captions</div>"#;
        assert_eq!(extract_segments(dom).as_deref(), Some("only captions"));
        assert_eq!(extract_segments("<p>nothing</p>"), None);
    }
}
