//! Discover command implementation.

use crate::browser::{ChromiumLauncher, ChromiumOptions};
use crate::config::Config;
use crate::format::Formatter;
use crate::listing::{HttpFetcher, ListingFetch, ListingScraper};
use crate::pipeline::Pipeline;
use anyhow::{Context, Result};
use tracing::info;

/// Walks the listing pages and writes the URL manifest.
pub struct DiscoverCommand {
    config: Config,
}

impl DiscoverCommand {
    /// Creates a new discover command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Executes discovery over HTTP and returns formatted output.
    pub async fn execute(&self) -> Result<String> {
        let fetcher = HttpFetcher::new(&self.config).context("Failed to create HTTP client")?;
        self.execute_with_fetcher(fetcher).await
    }

    /// Executes discovery with a provided fetcher (for testing).
    pub async fn execute_with_fetcher(&self, fetcher: impl ListingFetch) -> Result<String> {
        let base = self.config.search_base_url()?;
        info!("Discovering products from {}", base);

        let listing = ListingScraper::new(fetcher, base, &self.config.selectors)?;
        // Discovery never opens a session, so the browser is never launched.
        let launcher = ChromiumLauncher::new(ChromiumOptions::from_config(&self.config));
        let pipeline = Pipeline::new(&self.config, &launcher);

        let report = pipeline.discover(&listing).await.context("Discovery failed")?;
        Ok(Formatter::new(self.config.format).format_discover(&report))
    }
}
