//! Headless browser rendering.
//!
//! Pages that only expose data after client-side rendering are loaded through a headless
//! Chromium-family binary (`--headless --dump-dom`). The process is killed when the
//! deadline passes.

use crate::error::{KortError, Result};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, instrument};

/// A headless browser binary.
#[derive(Debug, Clone)]
pub struct BrowserEngine {
    binary: String,
    timeout: Duration,
    user_agent: Option<String>,
}

impl BrowserEngine {
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
            user_agent: None,
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Render a page and return its serialized DOM.
    #[instrument(skip(self), fields(engine = %self.binary))]
    pub async fn dump_dom(&self, url: &str) -> Result<String> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("--headless")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--mute-audio")
            .arg(format!("--virtual-time-budget={}", self.timeout.as_millis() / 2));

        if let Some(ua) = &self.user_agent {
            cmd.arg(format!("--user-agent={}", ua));
        }

        cmd.arg("--dump-dom")
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| KortError::from_spawn(&self.binary, e))?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| KortError::Timeout {
                operation: format!("{} rendering {}", self.binary, url),
                seconds: self.timeout.as_secs(),
            })??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(KortError::ToolFailed(format!(
                "{} exited with {}: {}",
                self.binary,
                output.status,
                stderr.lines().last().unwrap_or_default()
            )));
        }

        let dom = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!("Rendered {} bytes of DOM", dom.len());

        if dom.trim().is_empty() {
            return Err(KortError::Scrape(format!("{} returned an empty DOM", self.binary)));
        }

        Ok(dom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_engine_is_tool_not_found() {
        let engine = BrowserEngine::new("kort-no-such-browser", Duration::from_secs(1));
        let err = engine.dump_dom("https://example.com").await.unwrap_err();
        assert!(matches!(err, KortError::ToolNotFound(name) if name == "kort-no-such-browser"));
    }
}
