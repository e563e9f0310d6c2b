//! Extract command implementation.

use crate::browser::{ChromiumLauncher, ChromiumOptions, SessionLauncher};
use crate::config::Config;
use crate::format::Formatter;
use crate::pipeline::Pipeline;
use anyhow::{Context, Result};

/// Extracts records for every URL in an existing manifest, then runs the
/// cart interaction if enabled.
pub struct ExtractCommand {
    config: Config,
}

impl ExtractCommand {
    /// Creates a new extract command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Executes extraction in Chromium and returns formatted output.
    pub async fn execute(&self) -> Result<String> {
        let launcher = ChromiumLauncher::new(ChromiumOptions::from_config(&self.config));
        self.execute_with_launcher(&launcher).await
    }

    /// Executes extraction with a provided launcher (for testing).
    pub async fn execute_with_launcher(&self, launcher: &dyn SessionLauncher) -> Result<String> {
        let pipeline = Pipeline::new(&self.config, launcher);
        let report = pipeline.run_from_manifest().await.context("Extraction failed")?;
        Ok(Formatter::new(self.config.format).format_run(&report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::mock::{MockLauncher, MockPage, MockSite};
    use crate::error::ScrapeError;
    use tempfile::TempDir;

    const URL: &str = "https://www.amazon.in/boAt-Rockerz/dp/B01";

    fn make_test_config(dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.manifest_path = dir.path().join("urls.csv");
        config.output_path = dir.path().join("details.csv");
        config.delay_ms = 0;
        config.field_timeout_secs = 0;
        config.settle_timeout_secs = 0;
        config.click_timeout_secs = 0;
        config.poll_interval_ms = 1;
        config
    }

    #[tokio::test]
    async fn test_extract_command_missing_reviews() {
        let dir = TempDir::new().unwrap();
        let config = make_test_config(&dir);
        crate::store::write_manifest(&config.manifest_path, &[URL.to_string()]).unwrap();

        let page = MockPage::default()
            .with_text("#productTitle", "boAt Rockerz 450")
            .with_text(".a-price-whole", "799.")
            .with_control("#add-to-cart-button", true);
        let launcher = MockLauncher::new(MockSite::default().page(URL, page));

        let output =
            ExtractCommand::new(config.clone()).execute_with_launcher(&launcher).await.unwrap();
        assert!(output.contains("799.00"));
        assert!(output.contains("Add to cart: added to cart"));

        let written = std::fs::read_to_string(&config.output_path).unwrap();
        assert!(written.contains(&format!("{},boAt Rockerz 450,799,N/A", URL)));
    }

    #[tokio::test]
    async fn test_extract_command_missing_manifest() {
        let dir = TempDir::new().unwrap();
        let config = make_test_config(&dir);
        let launcher = MockLauncher::new(MockSite::default());

        let err = ExtractCommand::new(config).execute_with_launcher(&launcher).await.unwrap_err();
        let cause = err.downcast_ref::<ScrapeError>().unwrap();
        assert!(matches!(cause, ScrapeError::ManifestNotFound(_)));
        assert!(cause.is_batch_fatal());
        assert_eq!(launcher.opened(), 0);
    }
}
