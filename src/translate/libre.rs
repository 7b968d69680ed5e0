//! LibreTranslate-compatible HTTP provider.

use super::TranslationProvider;
use crate::error::{KortError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Serialize)]
struct DetectRequest<'a> {
    q: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct Detection {
    language: String,
    #[serde(default)]
    confidence: f64,
}

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslateResponse {
    translated_text: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Client for a LibreTranslate server (`POST /detect`, `POST /translate`).
pub struct LibreTranslateProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl LibreTranslateProvider {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.is_empty());
        self
    }

    async fn post<B: Serialize + ?Sized>(&self, endpoint: &str, body: &B) -> Result<reqwest::Response> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!("POST {}", url);
        let response = self.client.post(&url).json(body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .json::<ErrorResponse>()
                .await
                .map(|e| e.error)
                .unwrap_or_else(|_| status.to_string());
            return Err(KortError::Provider(format!("{} returned {}: {}", endpoint, status, message)));
        }
        Ok(response)
    }
}

#[async_trait]
impl TranslationProvider for LibreTranslateProvider {
    fn name(&self) -> &str {
        "libretranslate"
    }

    async fn detect(&self, text: &str) -> Result<String> {
        let request = DetectRequest {
            q: text,
            api_key: self.api_key.as_deref(),
        };
        let detections: Vec<Detection> = self.post("detect", &request).await?.json().await?;

        detections
            .into_iter()
            .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
            .map(|d| d.language)
            .ok_or_else(|| KortError::Provider("detect returned no languages".into()))
    }

    async fn translate(&self, text: &str, from: &str, to: &str) -> Result<String> {
        let request = TranslateRequest {
            q: text,
            source: from,
            target: to,
            format: "text",
            api_key: self.api_key.as_deref(),
        };
        let response: TranslateResponse = self.post("translate", &request).await?.json().await?;
        Ok(response.translated_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::http::create_client;
    use crate::config::AcquisitionSettings;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> LibreTranslateProvider {
        let client = create_client(&AcquisitionSettings::default()).unwrap();
        LibreTranslateProvider::new(client, server.uri()).with_api_key(Some("secret".into()))
    }

    #[tokio::test]
    async fn test_detect_picks_highest_confidence() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/detect"))
            .and(body_partial_json(json!({ "api_key": "secret" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "language": "es", "confidence": 40.0 },
                { "language": "pt", "confidence": 90.0 }
            ])))
            .mount(&server)
            .await;

        let detected = provider(&server).detect("Olá, tudo bem com você?").await.unwrap();
        assert_eq!(detected, "pt");
    }

    #[tokio::test]
    async fn test_translate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/translate"))
            .and(body_partial_json(json!({ "source": "en", "target": "es" })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "translatedText": "Hola mundo" })),
            )
            .mount(&server)
            .await;

        let out = provider(&server).translate("Hello world", "en", "es").await.unwrap();
        assert_eq!(out, "Hola mundo");
    }

    #[tokio::test]
    async fn test_error_status_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/translate"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({ "error": "xx is not supported" })),
            )
            .mount(&server)
            .await;

        let err = provider(&server).translate("Hello", "en", "xx").await.unwrap_err();
        assert!(matches!(err, KortError::Provider(ref m) if m.contains("xx is not supported")));
    }
}
