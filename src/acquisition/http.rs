//! HTTP client configuration shared by the scraping strategies.

use crate::config::AcquisitionSettings;
use crate::error::{KortError, Result};
use std::time::Duration;
use tracing::debug;

/// Create an HTTP client with the configured timeout and user agent.
pub fn create_client(settings: &AcquisitionSettings) -> Result<reqwest::Client> {
    create_client_with_timeout(
        &settings.user_agent,
        Duration::from_secs(settings.http_timeout_seconds),
    )
}

/// Create an HTTP client with a custom timeout.
pub fn create_client_with_timeout(user_agent: &str, timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
        .map_err(KortError::Http)
}

/// GET a URL and return the body, treating non-2xx statuses as errors.
pub async fn fetch_text(client: &reqwest::Client, url: &str) -> Result<String> {
    debug!("GET {}", url);
    let response = client
        .get(url)
        .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
        .send()
        .await?
        .error_for_status()?;

    Ok(response.text().await?)
}
