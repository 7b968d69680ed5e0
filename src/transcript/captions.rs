//! Caption track retrieval.
//!
//! The watch page embeds the player response, whose `captionTracks` array lists
//! timed-text URLs. Manual English tracks are preferred over auto-generated ones.

use super::check_length;
use crate::acquisition::http::fetch_text;
use crate::acquisition::Strategy;
use crate::error::{KortError, Result};
use crate::source::{youtube, SourceReference};
use async_trait::async_trait;
use scraper::{Html, Selector};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    #[serde(default)]
    language_code: String,
    /// `asr` for auto-generated tracks.
    #[serde(default)]
    kind: Option<String>,
}

/// Fetches the caption track listed on the watch page.
pub struct CaptionsStrategy {
    client: reqwest::Client,
    base_url: String,
    min_chars: usize,
}

impl CaptionsStrategy {
    pub fn new(client: reqwest::Client, min_chars: usize) -> Self {
        Self {
            client,
            base_url: youtube::BASE_URL.to_string(),
            min_chars,
        }
    }

    /// Point the strategy at a different host (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl Strategy<String> for CaptionsStrategy {
    fn name(&self) -> &'static str {
        "captions"
    }

    #[instrument(skip_all, fields(video_id = %source.content_id))]
    async fn acquire(&self, source: &SourceReference) -> Result<String> {
        let page_url = format!("{}/watch?v={}", self.base_url, source.content_id);
        let html = fetch_text(&self.client, &page_url).await?;

        let tracks: Vec<CaptionTrack> = parse_after_key(&html, "\"captionTracks\":")
            .ok_or_else(|| KortError::Scrape("No caption tracks on the watch page".into()))?;

        let track = pick_track(&tracks)
            .ok_or_else(|| KortError::Scrape("Caption track list is empty".into()))?;
        debug!(
            "Using caption track lang={} kind={:?}",
            track.language_code, track.kind
        );

        let xml = fetch_text(&self.client, &track.base_url).await?;
        let text = parse_timed_text(&xml);
        if text.is_empty() {
            return Err(KortError::Scrape("Caption track has no text".into()));
        }
        Ok(text)
    }

    fn validate(&self, value: &String) -> std::result::Result<(), String> {
        check_length(value, self.min_chars)
    }
}

/// Manual English first, then auto-generated English, then whatever is listed first.
fn pick_track(tracks: &[CaptionTrack]) -> Option<&CaptionTrack> {
    let is_english = |t: &&CaptionTrack| t.language_code.starts_with("en");
    let is_asr = |t: &&CaptionTrack| t.kind.as_deref() == Some("asr");

    tracks
        .iter()
        .find(|t| is_english(t) && !is_asr(t))
        .or_else(|| tracks.iter().find(is_english))
        .or_else(|| tracks.first())
}

/// Deserialize the JSON value that directly follows `key` in `haystack`.
///
/// Trailing content after the value is ignored, so this works on a key embedded in a
/// larger script.
pub(crate) fn parse_after_key<T: DeserializeOwned>(haystack: &str, key: &str) -> Option<T> {
    let start = haystack.find(key)? + key.len();
    serde_json::Deserializer::from_str(&haystack[start..])
        .into_iter::<T>()
        .next()?
        .ok()
}

/// Join the text nodes of a timed-text document into one normalized string.
pub(crate) fn parse_timed_text(xml: &str) -> String {
    let doc = Html::parse_fragment(xml);
    let selector = Selector::parse("text, p").expect("Invalid selector");

    let joined = doc
        .select(&selector)
        .map(|el| el.text().collect::<String>())
        .map(|t| decode_entities(&t))
        .collect::<Vec<_>>()
        .join(" ");

    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Timed text is frequently double-escaped; the parser only removes one layer.
fn decode_entities(text: &str) -> String {
    text.replace("&#39;", "'")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::http::create_client;
    use crate::config::AcquisitionSettings;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_parse_after_key_handles_nesting_and_strings() {
        let html = r#"var x = {"captionTracks":[{"baseUrl":"a]b","languageCode":"en","name":{"runs":[{"text":"x"}]}}],"other":1};"#;
        let tracks: Vec<CaptionTrack> = parse_after_key(html, "\"captionTracks\":").unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].base_url, "a]b");
        assert_eq!(tracks[0].language_code, "en");

        assert!(parse_after_key::<Vec<CaptionTrack>>(html, "\"missing\":").is_none());
        assert!(parse_after_key::<Vec<CaptionTrack>>(html, "\"other\":").is_none());
    }

    #[test]
    fn test_parse_timed_text() {
        let xml = r#"<?xml version="1.0" encoding="utf-8" ?><transcript>
            <text start="0.1" dur="2">Hello &amp;#39;world&amp;#39;</text>
            <text start="2.1" dur="2">second
            line</text></transcript>"#;
        assert_eq!(parse_timed_text(xml), "Hello 'world' second line");
    }

    #[test]
    fn test_pick_track_prefers_manual_english() {
        let tracks: Vec<CaptionTrack> = serde_json::from_str(
            r#"[{"baseUrl":"de","languageCode":"de"},
                {"baseUrl":"en-asr","languageCode":"en","kind":"asr"},
                {"baseUrl":"en","languageCode":"en"}]"#,
        )
        .unwrap();
        assert_eq!(pick_track(&tracks).unwrap().base_url, "en");
        assert_eq!(pick_track(&tracks[..2]).unwrap().base_url, "en-asr");
        assert_eq!(pick_track(&tracks[..1]).unwrap().base_url, "de");
    }

    #[tokio::test]
    async fn test_captions_from_watch_page() {
        let server = MockServer::start().await;
        let page = format!(
            r#"<html><script>var ytInitialPlayerResponse = {{"captions":{{"playerCaptionsTracklistRenderer":{{"captionTracks":[{{"baseUrl":"{}/api/timedtext?v=dQw4w9WgXcQ&lang=en","languageCode":"en"}}]}}}}}};</script></html>"#,
            server.uri()
        );
        Mock::given(method("GET"))
            .and(path("/watch"))
            .and(query_param("v", "dQw4w9WgXcQ"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/timedtext"))
            .and(query_param("lang", "en"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<transcript><text start="0" dur="1">Never gonna give you up</text></transcript>"#,
            ))
            .mount(&server)
            .await;

        let client = create_client(&AcquisitionSettings::default()).unwrap();
        let strategy = CaptionsStrategy::new(client, 10).with_base_url(server.uri());
        let source = SourceReference::parse("dQw4w9WgXcQ").unwrap();

        let text = strategy.acquire(&source).await.unwrap();
        assert_eq!(text, "Never gonna give you up");
        assert!(strategy.validate(&text).is_ok());
    }

    #[tokio::test]
    async fn test_page_without_captions_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/watch"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let client = create_client(&AcquisitionSettings::default()).unwrap();
        let strategy = CaptionsStrategy::new(client, 100).with_base_url(server.uri());
        let source = SourceReference::parse("dQw4w9WgXcQ").unwrap();

        let err = strategy.acquire(&source).await.unwrap_err();
        assert!(matches!(err, KortError::Scrape(_)));
    }
}
