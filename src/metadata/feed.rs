//! Channel feed lookup.
//!
//! The channel ID is read from the watch page, then the channel's Atom feed is searched
//! for an entry linking to the video. Feeds only list recent uploads, so older videos
//! are not found here.

use super::duration::{normalize_date, normalize_view_count};
use super::scrape::extract_channel_id;
use super::{non_empty, PartialMetadata};
use crate::acquisition::http::fetch_text;
use crate::acquisition::Strategy;
use crate::error::{KortError, Result};
use crate::source::{youtube, SourceReference};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

pub struct FeedStrategy {
    client: reqwest::Client,
    base_url: String,
}

impl FeedStrategy {
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
impl Strategy<PartialMetadata> for FeedStrategy {
    fn name(&self) -> &'static str {
        "channel-feed"
    }

    async fn acquire(&self, source: &SourceReference) -> Result<PartialMetadata> {
        let page = fetch_text(
            &self.client,
            &format!("{}/watch?v={}", self.base_url, source.content_id),
        )
        .await?;
        let channel_id = extract_channel_id(&page)
            .ok_or_else(|| KortError::Scrape("Could not extract channel ID".into()))?;
        debug!("Channel ID: {}", channel_id);

        let feed_url = format!("{}/feeds/videos.xml?channel_id={}", self.base_url, channel_id);
        let feed = fetch_text(&self.client, &feed_url).await?;

        find_entry(&feed, source.content_id.as_str()).ok_or_else(|| {
            KortError::Scrape(format!("Video not listed in channel feed {}", channel_id))
        })
    }

    fn validate(&self, value: &PartialMetadata) -> std::result::Result<(), String> {
        value.check_title()
    }
}

/// Namespaced feed elements (`yt:videoId`, `media:statistics`) are matched by raw name.
fn descendant<'a>(entry: ElementRef<'a>, name: &str) -> Option<ElementRef<'a>> {
    entry
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == name)
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>()
}

/// Locate the entry for `video_id` and pull its fields.
pub fn find_entry(feed: &str, video_id: &str) -> Option<PartialMetadata> {
    let doc = Html::parse_document(feed);
    let entry_sel = Selector::parse("entry").ok()?;

    let feed_author = Selector::parse("feed > author > name")
        .ok()
        .and_then(|sel| doc.select(&sel).next().map(element_text));

    let entry = doc.select(&entry_sel).find(|entry| {
        let by_id = descendant(*entry, "yt:videoid")
            .map(|el| element_text(el).trim() == video_id)
            .unwrap_or(false);
        let by_link = descendant(*entry, "link")
            .and_then(|el| el.value().attr("href"))
            .map(|href| href.contains(video_id))
            .unwrap_or(false);
        by_id || by_link
    })?;

    let title = descendant(entry, "title").map(element_text);
    let author = descendant(entry, "author")
        .and_then(|a| descendant(a, "name"))
        .map(element_text)
        .or(feed_author);
    let publish_date = descendant(entry, "published")
        .map(element_text)
        .and_then(|d| normalize_date(&d));
    let view_count = descendant(entry, "media:statistics")
        .and_then(|el| el.value().attr("views"))
        .and_then(normalize_view_count);
    let description = descendant(entry, "media:description").map(element_text);

    Some(PartialMetadata {
        title: non_empty(title),
        author: non_empty(author),
        duration: None,
        view_count,
        publish_date,
        description: non_empty(description),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::http::create_client;
    use crate::config::AcquisitionSettings;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns:yt="http://www.youtube.com/xml/schemas/2015" xmlns:media="http://search.yahoo.com/mrss/" xmlns="http://www.w3.org/2005/Atom">
 <title>Conf Channel</title>
 <author><name>Conf Channel</name></author>
 <entry>
  <yt:videoId>otherVideo1</yt:videoId>
  <title>Some other talk</title>
  <link rel="alternate" href="https://www.youtube.com/watch?v=otherVideo1"/>
 </entry>
 <entry>
  <yt:videoId>dQw4w9WgXcQ</yt:videoId>
  <title>Rust &amp; Friends</title>
  <link rel="alternate" href="https://www.youtube.com/watch?v=dQw4w9WgXcQ"/>
  <author><name>Conf Channel</name></author>
  <published>2024-01-15T10:00:00+00:00</published>
  <media:group>
   <media:description>All about Rust.</media:description>
   <media:community><media:statistics views="4321"/></media:community>
  </media:group>
 </entry>
</feed>"#;

    #[test]
    fn test_find_entry() {
        let partial = find_entry(FEED, "dQw4w9WgXcQ").unwrap();
        assert_eq!(partial.title.as_deref(), Some("Rust & Friends"));
        assert_eq!(partial.author.as_deref(), Some("Conf Channel"));
        assert_eq!(partial.publish_date.as_deref(), Some("2024-01-15"));
        assert_eq!(partial.view_count.as_deref(), Some("4321"));
        assert_eq!(partial.description.as_deref(), Some("All about Rust."));
        assert!(partial.duration.is_none());
    }

    #[test]
    fn test_missing_entry() {
        assert!(find_entry(FEED, "aaaaaaaaaaa").is_none());
    }

    #[tokio::test]
    async fn test_feed_strategy() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/watch"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<html><script>{"externalId":"UCconf"}</script></html>"#,
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/feeds/videos.xml"))
            .and(query_param("channel_id", "UCconf"))
            .respond_with(ResponseTemplate::new(200).set_body_string(FEED))
            .mount(&server)
            .await;

        let client = create_client(&AcquisitionSettings::default()).unwrap();
        let strategy = FeedStrategy::new(client).with_base_url(server.uri());
        let source = SourceReference::parse("dQw4w9WgXcQ").unwrap();

        let partial = strategy.acquire(&source).await.unwrap();
        assert_eq!(partial.title.as_deref(), Some("Rust & Friends"));
        assert!(strategy.validate(&partial).is_ok());
    }
}
