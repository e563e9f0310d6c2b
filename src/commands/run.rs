//! Run command: every stage in sequence.

use crate::browser::{ChromiumLauncher, ChromiumOptions, SessionLauncher};
use crate::config::Config;
use crate::format::Formatter;
use crate::listing::{HttpFetcher, ListingFetch, ListingScraper};
use crate::pipeline::Pipeline;
use crate::throttle::Throttle;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

/// Discovers, extracts, simulates, and tears down.
pub struct RunCommand {
    config: Config,
    /// Paces listing requests and page navigations together
    throttle: Arc<Throttle>,
}

impl RunCommand {
    /// Creates a new run command.
    pub fn new(config: Config) -> Self {
        let throttle = Arc::new(Throttle::from_millis(config.delay_ms));
        Self { config, throttle }
    }

    /// Executes the full pipeline against the live storefront.
    pub async fn execute(&self) -> Result<String> {
        let fetcher = HttpFetcher::new(&self.config)
            .context("Failed to create HTTP client")?
            .with_throttle(Arc::clone(&self.throttle));
        let launcher = ChromiumLauncher::new(ChromiumOptions::from_config(&self.config));
        self.execute_with(fetcher, &launcher).await
    }

    /// Executes with a provided fetcher and launcher (for testing).
    pub async fn execute_with(
        &self,
        fetcher: impl ListingFetch,
        launcher: &dyn SessionLauncher,
    ) -> Result<String> {
        let base = self.config.search_base_url()?;
        info!("Running all stages from {}", base);

        let listing = ListingScraper::new(fetcher, base, &self.config.selectors)?;
        let pipeline = Pipeline::new(&self.config, launcher).with_throttle(Arc::clone(&self.throttle));
        let report = pipeline.run(&listing).await.context("Run failed")?;
        Ok(Formatter::new(self.config.format).format_run(&report))
    }
}
