//! HTML parser for search-results pages.

use crate::amazon::SiteSelectors;
use crate::error::Result;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use tracing::{trace, warn};
use url::Url;

/// Markers of Amazon's robot-check and "dog" error pages.
static BLOCKED: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        "form[action*='validateCaptcha'], \
         img[src*='captcha'], \
         img[alt*='dog']",
    )
    .unwrap()
});

/// Links found on one listing page.
#[derive(Debug, Clone, Default)]
pub struct ParsedListing {
    /// Resolved product URLs in document order
    pub links: Vec<String>,
    /// Anchors whose href could not be resolved
    pub skipped: usize,
    /// The page is a CAPTCHA or error page rather than results
    pub blocked: bool,
}

/// Extracts product links from listing HTML.
pub struct ListingParser {
    link: Selector,
}

impl ListingParser {
    /// Creates a parser for the configured product-link selector.
    pub fn new(selectors: &SiteSelectors) -> Result<Self> {
        Ok(Self { link: selectors.listing_link_selector()? })
    }

    /// Selects every product anchor and resolves its href against `page_url`.
    pub fn parse(&self, html: &str, page_url: &Url) -> ParsedListing {
        let document = Html::parse_document(html);
        let mut parsed = ParsedListing::default();

        for anchor in document.select(&self.link) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };

            match page_url.join(href.trim()) {
                Ok(url) => {
                    trace!("Found product link: {}", url);
                    parsed.links.push(url.into());
                }
                Err(e) => {
                    warn!("Skipping unresolvable href {:?} on {}: {}", href, page_url, e);
                    parsed.skipped += 1;
                }
            }
        }

        if parsed.links.is_empty() {
            parsed.blocked = document.select(&BLOCKED).next().is_some();
        }

        parsed
    }
}
