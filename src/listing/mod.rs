//! Listing discovery: search-results pages fetched over HTTP.

pub mod client;
pub mod parser;

pub use client::{HttpFetcher, ListingFetch, ListingResponse};
pub use parser::{ListingParser, ParsedListing};

use crate::amazon::SiteSelectors;
use crate::error::Result;
use tracing::{info, warn};
use url::Url;

/// One fetched search-results page. The body is not retained.
#[derive(Debug, Clone)]
pub struct ListingPage {
    /// 1-based page index
    pub page: u32,
    /// Request URL including the page parameter
    pub url: Url,
    /// HTTP status returned
    pub status: u16,
    /// Product URLs in document order
    pub links: Vec<String>,
    /// The storefront served a CAPTCHA or error page
    pub blocked: bool,
}

impl ListingPage {
    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Appends (or replaces) the `page` query parameter on a search URL.
pub fn page_url(base: &Url, page: u32) -> Url {
    let kept: Vec<(String, String)> = base
        .query_pairs()
        .filter(|(key, _)| key != "page")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut url = base.clone();
    url.set_query(None);
    url.query_pairs_mut().extend_pairs(kept).append_pair("page", &page.to_string());
    url
}

/// Scrapes product URLs from one search-results page at a time.
pub struct ListingScraper<F> {
    fetcher: F,
    parser: ListingParser,
    base: Url,
}

impl<F: ListingFetch> ListingScraper<F> {
    /// Creates a scraper for `base` using the configured link selector.
    pub fn new(fetcher: F, base: Url, selectors: &SiteSelectors) -> Result<Self> {
        Ok(Self { fetcher, parser: ListingParser::new(selectors)?, base })
    }

    /// Fetches and parses page `page`.
    ///
    /// Non-200 responses are logged and yield an empty page; only transport
    /// failures are returned as errors.
    pub async fn scrape_page(&self, page: u32) -> Result<ListingPage> {
        let url = page_url(&self.base, page);
        info!("Scraping page {}...", page);

        let response = self.fetcher.fetch(&url).await?;

        if response.status != 200 {
            warn!(
                "Failed to fetch listing page {} ({}): status {}",
                page, url, response.status
            );
            return Ok(ListingPage {
                page,
                url,
                status: response.status,
                links: Vec::new(),
                blocked: false,
            });
        }

        let parsed = self.parser.parse(&response.body, &url);
        if parsed.blocked {
            warn!("Listing page {} is a CAPTCHA or error page; no links extracted", page);
        }
        info!("Page {} yielded {} product links", page, parsed.links.len());

        Ok(ListingPage {
            page,
            url,
            status: response.status,
            links: parsed.links,
            blocked: parsed.blocked,
        })
    }
}
