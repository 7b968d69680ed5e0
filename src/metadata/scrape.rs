//! Watch page scraping.
//!
//! The same parser handles the raw HTML served to plain HTTP clients and the DOM
//! serialized by a headless browser, which additionally carries rendered elements.

use super::duration::{format_seconds, normalize_date, normalize_duration, normalize_view_count};
use super::{non_empty, PartialMetadata};
use crate::acquisition::http::fetch_text;
use crate::acquisition::Strategy;
use crate::error::{KortError, Result};
use crate::source::{youtube, SourceReference};
use async_trait::async_trait;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::OnceLock;
use tracing::debug;

pub struct PageScrapeStrategy {
    client: reqwest::Client,
    base_url: String,
}

impl PageScrapeStrategy {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: youtube::BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl Strategy<PartialMetadata> for PageScrapeStrategy {
    fn name(&self) -> &'static str {
        "page-scrape"
    }

    async fn acquire(&self, source: &SourceReference) -> Result<PartialMetadata> {
        let url = format!("{}/watch?v={}", self.base_url, source.content_id);
        let html = fetch_text(&self.client, &url).await?;
        let partial = parse_page(&html);

        if partial.check_title().is_err() {
            return Err(KortError::Scrape(
                "Could not extract meaningful video information".into(),
            ));
        }
        Ok(partial)
    }

    fn validate(&self, value: &PartialMetadata) -> std::result::Result<(), String> {
        value.check_title()
    }
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

/// First non-empty attribute value among the selectors.
fn first_attr(doc: &Html, selectors: &[&str], attr: &str) -> Option<String> {
    selectors.iter().find_map(|css| {
        let sel = selector(css)?;
        doc.select(&sel)
            .find_map(|el| non_empty(el.value().attr(attr).map(str::to_string)))
    })
}

/// First non-empty element text among the selectors.
fn first_text(doc: &Html, selectors: &[&str]) -> Option<String> {
    selectors.iter().find_map(|css| {
        let sel = selector(css)?;
        doc.select(&sel).find_map(|el| {
            let text = el.text().collect::<Vec<_>>().join(" ");
            non_empty(Some(text.split_whitespace().collect::<Vec<_>>().join(" ")))
        })
    })
}

fn json_ld(doc: &Html) -> Vec<serde_json::Value> {
    let Some(sel) = selector(r#"script[type="application/ld+json"]"#) else {
        return Vec::new();
    };
    doc.select(&sel)
        .filter_map(|el| serde_json::from_str(&el.inner_html()).ok())
        .collect()
}

fn player_field<'a>(html: &'a str, re: &'static OnceLock<Regex>, pattern: &str) -> Option<&'a str> {
    re.get_or_init(|| Regex::new(pattern).expect("Invalid regex"))
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Strip the site suffix browsers show in the window title.
fn clean_title(title: String) -> String {
    title
        .trim()
        .trim_end_matches("- YouTube")
        .trim()
        .to_string()
}

/// Extract whatever metadata a watch page exposes.
pub fn parse_page(html: &str) -> PartialMetadata {
    static LENGTH_RE: OnceLock<Regex> = OnceLock::new();
    static VIEWS_RE: OnceLock<Regex> = OnceLock::new();

    let doc = Html::parse_document(html);
    let ld = json_ld(&doc);
    let ld_str = |key: &str| -> Option<String> {
        ld.iter()
            .find_map(|v| v.get(key).and_then(|s| s.as_str()).map(str::to_string))
    };

    let title = first_attr(&doc, &[r#"meta[property="og:title"]"#, r#"meta[name="title"]"#], "content")
        .or_else(|| first_text(&doc, &["h1.title", "h1.ytd-watch-metadata yt-formatted-string"]))
        .or_else(|| first_text(&doc, &["title"]))
        .map(clean_title);

    let author = first_attr(
        &doc,
        &[
            r#"meta[name="author"]"#,
            r#"span[itemprop="author"] link[itemprop="name"]"#,
            r#"link[itemprop="name"]"#,
        ],
        "content",
    )
    .or_else(|| first_text(&doc, &["#owner-name a", "ytd-channel-name a"]))
    .or_else(|| {
        ld.iter().find_map(|v| {
            v.get("author")
                .and_then(|a| a.get("name").or(Some(a)))
                .and_then(|n| n.as_str())
                .map(str::to_string)
        })
    });

    let duration = first_attr(&doc, &[r#"meta[itemprop="duration"]"#], "content")
        .and_then(|d| normalize_duration(&d))
        .or_else(|| ld_str("duration").and_then(|d| normalize_duration(&d)))
        .or_else(|| first_text(&doc, &["span.ytp-time-duration", ".ytp-time-duration"]).and_then(|d| normalize_duration(&d)))
        .or_else(|| {
            player_field(html, &LENGTH_RE, r#""lengthSeconds":"(\d+)""#)
                .and_then(|s| s.parse().ok())
                .map(format_seconds)
        });

    let view_count = first_attr(
        &doc,
        &[r#"meta[itemprop="interactionCount"]"#, r#"meta[itemprop="userInteractionCount"]"#],
        "content",
    )
    .and_then(|v| normalize_view_count(&v))
    .or_else(|| first_text(&doc, &["#info-strings yt-formatted-string", ".view-count"]).and_then(|v| normalize_view_count(&v)))
    .or_else(|| player_field(html, &VIEWS_RE, r#""viewCount":"(\d+)""#).map(str::to_string));

    let publish_date = first_attr(
        &doc,
        &[r#"meta[itemprop="datePublished"]"#, r#"meta[itemprop="uploadDate"]"#],
        "content",
    )
    .or_else(|| ld_str("uploadDate"))
    .or_else(|| ld_str("datePublished"))
    .and_then(|d| normalize_date(&d));

    let description = first_attr(
        &doc,
        &[r#"meta[property="og:description"]"#, r#"meta[name="description"]"#],
        "content",
    );

    let partial = PartialMetadata {
        title: non_empty(title),
        author: non_empty(author),
        duration,
        view_count,
        publish_date,
        description,
    };
    debug!("Scraped page fields: {:?}", partial);
    partial
}

/// Find the uploading channel's ID in a watch page.
pub fn extract_channel_id(html: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r#""channelId":"([A-Za-z0-9_-]+)"|"externalId":"([A-Za-z0-9_-]+)"|youtube\.com/channel/([A-Za-z0-9_-]+)"#)
            .expect("Invalid regex")
    });

    let caps = re.captures(html)?;
    (1..=3).find_map(|i| caps.get(i)).map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::http::create_client;
    use crate::config::AcquisitionSettings;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const WATCH_PAGE: &str = r#"<!DOCTYPE html><html><head>
        <title>Rust in Production - YouTube</title>
        <meta property="og:title" content="Rust in Production">
        <meta property="og:description" content="A talk about shipping Rust.">
        <meta itemprop="duration" content="PT1H2M3S">
        <meta itemprop="interactionCount" content="12345">
        <meta itemprop="datePublished" content="2024-03-05T17:00:07-08:00">
        </head><body>
        <span itemprop="author" itemscope><link itemprop="name" content="Conf Channel"></span>
        <script>var ytInitialData = {"channelId":"UCabcdefghijklmnopqrstuv"};</script>
        </body></html>"#;

    #[test]
    fn test_parse_full_page() {
        let partial = parse_page(WATCH_PAGE);
        assert_eq!(partial.title.as_deref(), Some("Rust in Production"));
        assert_eq!(partial.author.as_deref(), Some("Conf Channel"));
        assert_eq!(partial.duration.as_deref(), Some("1:02:03"));
        assert_eq!(partial.view_count.as_deref(), Some("12345"));
        assert_eq!(partial.publish_date.as_deref(), Some("2024-03-05"));
        assert_eq!(partial.description.as_deref(), Some("A talk about shipping Rust."));
    }

    #[test]
    fn test_fallback_sources() {
        let html = r#"<html><head><title>Only Title - YouTube</title>
            <script type="application/ld+json">{"duration": "PT4M13S", "uploadDate": "2023-11-02"}</script>
            </head><body><script>{"lengthSeconds":"999","viewCount":"77"}</script></body></html>"#;
        let partial = parse_page(html);
        assert_eq!(partial.title.as_deref(), Some("Only Title"));
        assert_eq!(partial.duration.as_deref(), Some("4:13"));
        assert_eq!(partial.view_count.as_deref(), Some("77"));
        assert_eq!(partial.publish_date.as_deref(), Some("2023-11-02"));
        assert!(partial.author.is_none());
    }

    #[test]
    fn test_site_title_is_rejected() {
        let partial = parse_page("<html><head><title>YouTube</title></head></html>");
        assert!(partial.check_title().is_err());
    }

    #[test]
    fn test_extract_channel_id() {
        assert_eq!(extract_channel_id(WATCH_PAGE).as_deref(), Some("UCabcdefghijklmnopqrstuv"));
        assert_eq!(
            extract_channel_id(r#"<a href="https://www.youtube.com/channel/UCxyz">"#).as_deref(),
            Some("UCxyz")
        );
        assert_eq!(extract_channel_id("<html></html>"), None);
    }

    #[tokio::test]
    async fn test_scrape_strategy() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/watch"))
            .respond_with(ResponseTemplate::new(200).set_body_string(WATCH_PAGE))
            .mount(&server)
            .await;

        let client = create_client(&AcquisitionSettings::default()).unwrap();
        let strategy = PageScrapeStrategy::new(client).with_base_url(server.uri());
        let source = SourceReference::parse("dQw4w9WgXcQ").unwrap();

        let partial = strategy.acquire(&source).await.unwrap();
        assert_eq!(partial.title.as_deref(), Some("Rust in Production"));
    }
}
