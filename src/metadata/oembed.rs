//! oEmbed lookup.

use super::{non_empty, PartialMetadata};
use crate::acquisition::Strategy;
use crate::error::{KortError, Result};
use crate::source::{youtube, SourceReference};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct OEmbedResponse {
    title: Option<String>,
    author_name: Option<String>,
}

pub struct OEmbedStrategy {
    client: reqwest::Client,
    base_url: String,
}

impl OEmbedStrategy {
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
impl Strategy<PartialMetadata> for OEmbedStrategy {
    fn name(&self) -> &'static str {
        "oembed"
    }

    async fn acquire(&self, source: &SourceReference) -> Result<PartialMetadata> {
        let endpoint = format!("{}/oembed", self.base_url);
        debug!("oEmbed lookup for {}", source.url);

        let response = self
            .client
            .get(&endpoint)
            .query(&[("url", source.url.as_str()), ("format", "json")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(KortError::Scrape(format!("oEmbed returned {}", status)));
        }

        let body: OEmbedResponse = response.json().await?;
        let title = non_empty(body.title)
            .ok_or_else(|| KortError::Scrape("oEmbed returned incomplete data".into()))?;

        Ok(PartialMetadata {
            title: Some(title),
            author: non_empty(body.author_name),
            ..Default::default()
        })
    }

    fn validate(&self, value: &PartialMetadata) -> std::result::Result<(), String> {
        value.check_title()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::http::create_client;
    use crate::config::AcquisitionSettings;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> reqwest::Client {
        create_client(&AcquisitionSettings::default()).unwrap()
    }

    #[tokio::test]
    async fn test_oembed_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/oembed"))
            .and(query_param("url", "https://www.youtube.com/watch?v=dQw4w9WgXcQ"))
            .and(query_param("format", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "title": "Never Gonna Give You Up",
                "author_name": "Rick Astley",
                "thumbnail_url": "https://i.ytimg.com/vi/dQw4w9WgXcQ/hqdefault.jpg"
            })))
            .mount(&server)
            .await;

        let strategy = OEmbedStrategy::new(client()).with_base_url(server.uri());
        let source = SourceReference::parse("dQw4w9WgXcQ").unwrap();
        let partial = strategy.acquire(&source).await.unwrap();

        assert_eq!(partial.title.as_deref(), Some("Never Gonna Give You Up"));
        assert_eq!(partial.author.as_deref(), Some("Rick Astley"));
        assert!(partial.duration.is_none());
    }

    #[tokio::test]
    async fn test_oembed_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/oembed"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let strategy = OEmbedStrategy::new(client()).with_base_url(server.uri());
        let source = SourceReference::parse("dQw4w9WgXcQ").unwrap();
        let err = strategy.acquire(&source).await.unwrap_err();

        assert!(err.to_string().contains("401"));
    }
}
