//! Product-page scraping: navigate, settle, read each field independently.

use super::field::FieldExtractor;
use crate::amazon::{ProductRecord, UnavailableReason};
use crate::browser::{wait_until_ready, BrowserSession, WaitPolicy};
use crate::config::Config;
use tracing::{info, warn};

/// Assembles a [`ProductRecord`] from one product page.
#[derive(Debug, Clone)]
pub struct DetailScraper {
    fields: FieldExtractor,
    settle: WaitPolicy,
}

impl DetailScraper {
    pub fn new(fields: FieldExtractor, settle: WaitPolicy) -> Self {
        Self { fields, settle }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            FieldExtractor::from_config(config),
            WaitPolicy::new(config.settle_timeout(), config.poll_interval()),
        )
    }

    /// Scrapes `url`. Always returns a record; failures show up as
    /// unavailable fields.
    pub async fn scrape(&self, session: &mut dyn BrowserSession, url: &str) -> ProductRecord {
        info!("Processing: {}", url);

        if let Err(e) = session.navigate(url).await {
            warn!("Error processing {}: {}", url, e);
            return ProductRecord::unavailable(url, UnavailableReason::Navigation(e.to_string()));
        }

        if let Err(e) = wait_until_ready(session, self.settle).await {
            warn!("{} did not finish loading ({}); extracting anyway", url, e);
        }

        let title = self.fields.title(session, url).await;
        let price = self.fields.price(session, url).await;
        let reviews = self.fields.reviews(session, url).await;

        let record = ProductRecord { url: url.to_string(), title, price, reviews };
        if record.is_empty() {
            warn!("No fields could be extracted from {}", url);
        }
        record
    }
}
