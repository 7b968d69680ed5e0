//! Metadata from a headless browser rendering of the watch page.

use super::scrape::parse_page;
use super::PartialMetadata;
use crate::acquisition::browser::BrowserEngine;
use crate::acquisition::Strategy;
use crate::error::{KortError, Result};
use crate::source::SourceReference;
use async_trait::async_trait;

pub struct BrowserMetadataStrategy {
    name: &'static str,
    engine: BrowserEngine,
}

impl BrowserMetadataStrategy {
    pub fn new(name: &'static str, engine: BrowserEngine) -> Self {
        Self { name, engine }
    }
}

#[async_trait]
impl Strategy<PartialMetadata> for BrowserMetadataStrategy {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn acquire(&self, source: &SourceReference) -> Result<PartialMetadata> {
        let dom = self.engine.dump_dom(&source.url).await?;
        let partial = parse_page(&dom);
        partial.check_title().map_err(|reason| {
            KortError::Scrape(format!("{}: {}", self.engine.binary(), reason))
        })?;
        Ok(partial)
    }

    fn validate(&self, value: &PartialMetadata) -> std::result::Result<(), String> {
        value.check_title()
    }
}
