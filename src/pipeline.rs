//! Stage orchestration: discover, extract, simulate, teardown.

use crate::amazon::{InteractionResult, ProductRecord, UnavailableReason};
use crate::browser::{BrowserSession, SessionLauncher};
use crate::config::Config;
use crate::error::Result;
use crate::extract::{DetailScraper, InteractionSimulator};
use crate::listing::{ListingFetch, ListingScraper};
use crate::store;
use crate::throttle::Throttle;
use futures::future::join_all;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Discover,
    Extract,
    Simulate,
    Teardown,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Discover => "discover",
            Self::Extract => "extract",
            Self::Simulate => "simulate",
            Self::Teardown => "teardown",
        };
        write!(f, "{}", name)
    }
}

/// Outcome of the discover stage.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoverReport {
    pub pages_attempted: u32,
    /// Pages that failed in transport or returned a non-200 status
    pub failed_pages: Vec<u32>,
    /// Pages served as CAPTCHA or error pages
    pub blocked_pages: Vec<u32>,
    pub urls: Vec<String>,
    pub manifest: PathBuf,
}

impl DiscoverReport {
    pub fn url_count(&self) -> usize {
        self.urls.len()
    }
}

/// Outcome of the extract stage.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractReport {
    /// One record per manifest entry, in manifest order
    pub records: Vec<ProductRecord>,
    pub timed_out: usize,
    pub output: PathBuf,
}

impl ExtractReport {
    /// Records with every field present.
    pub fn complete(&self) -> usize {
        self.records.iter().filter(|r| r.present_count() == 3).count()
    }

    /// Records with no field present.
    pub fn empty(&self) -> usize {
        self.records.iter().filter(|r| r.is_empty()).count()
    }
}

/// Why a run ended before extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Discovery found no product URLs.
    NothingDiscovered,
    /// The manifest exists but lists no URLs.
    EmptyManifest,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NothingDiscovered => write!(f, "no product URLs discovered"),
            Self::EmptyManifest => write!(f, "manifest is empty"),
        }
    }
}

/// What a full or partial run produced.
#[derive(Debug, Default)]
pub struct RunReport {
    pub discover: Option<DiscoverReport>,
    pub extract: Option<ExtractReport>,
    pub interaction: Option<InteractionResult>,
    /// Set when the run stopped before the extract stage did any work
    pub stopped: Option<StopReason>,
}

/// Drives the stages against one configuration and one browser launcher.
///
/// Sessions opened by any stage are kept in an idle pool so later stages can
/// reuse them; [`Pipeline::teardown`] closes them all and shuts the browser
/// down.
pub struct Pipeline<'a> {
    config: &'a Config,
    launcher: &'a dyn SessionLauncher,
    throttle: Arc<Throttle>,
    detail: DetailScraper,
    simulator: InteractionSimulator,
    idle: Mutex<Vec<Box<dyn BrowserSession>>>,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config, launcher: &'a dyn SessionLauncher) -> Self {
        Self {
            config,
            launcher,
            throttle: Arc::new(Throttle::from_millis(config.delay_ms)),
            detail: DetailScraper::from_config(config),
            simulator: InteractionSimulator::from_config(config),
            idle: Mutex::new(Vec::new()),
        }
    }

    /// Paces navigations with `throttle`, typically the one the listing
    /// fetcher also uses.
    pub fn with_throttle(mut self, throttle: Arc<Throttle>) -> Self {
        self.throttle = throttle;
        self
    }

    /// Runs every stage. Teardown runs whatever the outcome.
    pub async fn run<F: ListingFetch>(&self, listing: &ListingScraper<F>) -> Result<RunReport> {
        let outcome = self.run_stages(Some(listing)).await;
        self.teardown().await;
        outcome
    }

    /// Runs extract and simulate against an existing manifest, then tears down.
    pub async fn run_from_manifest(&self) -> Result<RunReport> {
        let outcome = self.run_stages::<NoFetch>(None).await;
        self.teardown().await;
        outcome
    }

    async fn run_stages<F: ListingFetch>(
        &self,
        listing: Option<&ListingScraper<F>>,
    ) -> Result<RunReport> {
        let mut report = RunReport::default();

        if let Some(listing) = listing {
            let discovered = self.discover(listing).await?;
            let empty = discovered.urls.is_empty();
            report.discover = Some(discovered);
            if empty {
                info!("No product URLs discovered; stopping before extraction");
                report.stopped = Some(StopReason::NothingDiscovered);
                return Ok(report);
            }
        }

        let Some(extracted) = self.extract().await? else {
            report.stopped = Some(StopReason::EmptyManifest);
            return Ok(report);
        };

        if self.config.simulate {
            if let Some(first) = extracted.records.first() {
                report.interaction = Some(self.simulate(&first.url).await?);
            }
        } else {
            debug!("Interaction simulation disabled");
        }

        report.extract = Some(extracted);
        Ok(report)
    }

    /// Walks listing pages `1..=pages` and persists every product URL found.
    ///
    /// Page failures are logged and skipped. The manifest is written even
    /// when nothing was found.
    pub async fn discover<F: ListingFetch>(
        &self,
        listing: &ListingScraper<F>,
    ) -> Result<DiscoverReport> {
        info!("Stage: {}", Stage::Discover);

        let pages = self.config.pages;
        let mut urls = Vec::new();
        let mut failed_pages = Vec::new();
        let mut blocked_pages = Vec::new();

        for page in 1..=pages {
            match listing.scrape_page(page).await {
                Ok(result) => {
                    if !result.is_success() {
                        failed_pages.push(page);
                    }
                    if result.blocked {
                        blocked_pages.push(page);
                    }
                    urls.extend(result.links);
                }
                Err(e) if e.is_batch_fatal() => return Err(e),
                Err(e) => {
                    warn!("Skipping listing page {}: {}", page, e);
                    failed_pages.push(page);
                }
            }
        }

        if self.config.dedup {
            let before = urls.len();
            let mut seen = HashSet::new();
            urls.retain(|url| seen.insert(url.clone()));
            debug!("Dropped {} duplicate URLs", before - urls.len());
        }

        store::write_manifest(&self.config.manifest_path, &urls)?;
        info!(
            "Discovered {} product URLs across {} pages ({} failed)",
            urls.len(),
            pages,
            failed_pages.len()
        );

        Ok(DiscoverReport {
            pages_attempted: pages,
            failed_pages,
            blocked_pages,
            urls,
            manifest: self.config.manifest_path.clone(),
        })
    }

    /// Extracts one record per manifest URL and writes them in one batch.
    ///
    /// Returns `Ok(None)` when the manifest is empty. A missing manifest is an
    /// error; in both cases no browser is started.
    pub async fn extract(&self) -> Result<Option<ExtractReport>> {
        info!("Stage: {}", Stage::Extract);

        let urls = match store::read_manifest(&self.config.manifest_path) {
            Ok(urls) => urls,
            Err(e) => {
                warn!("{}; skipping extraction", e);
                return Err(e);
            }
        };
        if urls.is_empty() {
            info!("Manifest {} is empty; nothing to extract", self.config.manifest_path.display());
            return Ok(None);
        }

        let workers = self.config.workers.clamp(1, urls.len());
        let sessions = self.checkout_many(workers).await?;
        info!("Extracting {} products with {} worker(s)", urls.len(), workers);

        let next = AtomicUsize::new(0);
        let timed_out = AtomicUsize::new(0);
        let (next, timed_out, urls_ref) = (&next, &timed_out, &urls);

        let results = join_all(sessions.into_iter().map(|mut session| async move {
            let mut records = Vec::new();
            loop {
                let index = next.fetch_add(1, Ordering::SeqCst);
                let Some(url) = urls_ref.get(index) else { break };
                let record = self.extract_one(session.as_mut(), url).await;
                if matches!(record.title.reason(), Some(UnavailableReason::PageTimedOut { .. })) {
                    timed_out.fetch_add(1, Ordering::SeqCst);
                }
                records.push((index, record));
            }
            (session, records)
        }))
        .await;

        let mut indexed = Vec::with_capacity(urls.len());
        for (session, records) in results {
            self.checkin(session).await;
            indexed.extend(records);
        }
        indexed.sort_by_key(|(index, _)| *index);
        let records: Vec<ProductRecord> = indexed.into_iter().map(|(_, r)| r).collect();

        store::write_records(&self.config.output_path, &records)?;

        let report = ExtractReport {
            records,
            timed_out: timed_out.load(Ordering::SeqCst),
            output: self.config.output_path.clone(),
        };
        info!(
            "Extracted {} records ({} complete, {} empty)",
            report.records.len(),
            report.complete(),
            report.empty()
        );
        Ok(Some(report))
    }

    async fn extract_one(&self, session: &mut dyn BrowserSession, url: &str) -> ProductRecord {
        self.throttle.acquire().await;

        let limit = self.config.page_timeout();
        match tokio::time::timeout(limit, self.detail.scrape(session, url)).await {
            Ok(record) => record,
            Err(_) => {
                warn!("Gave up on {} after {}s", url, limit.as_secs());
                ProductRecord::unavailable(url, UnavailableReason::PageTimedOut { timeout: limit })
            }
        }
    }

    /// Runs the add-to-cart interaction on `url`.
    ///
    /// Interaction failures are reported in the result; only a browser that
    /// cannot be launched is an error.
    pub async fn simulate(&self, url: &str) -> Result<InteractionResult> {
        info!("Stage: {}", Stage::Simulate);

        let mut session = self.checkout().await?;
        self.throttle.acquire().await;
        let result = self.simulator.add_to_cart(session.as_mut(), url).await;
        self.checkin(session).await;
        Ok(result)
    }

    /// Closes every pooled session and shuts the browser down. Failures are
    /// logged only.
    pub async fn teardown(&self) {
        info!("Stage: {}", Stage::Teardown);

        let sessions: Vec<_> = self.idle.lock().await.drain(..).collect();
        for session in sessions {
            if let Err(e) = session.close().await {
                warn!("Failed to close browser tab: {}", e);
            }
        }
        if let Err(e) = self.launcher.shutdown().await {
            warn!("Failed to shut down the browser: {}", e);
        }
    }

    async fn checkout(&self) -> Result<Box<dyn BrowserSession>> {
        if let Some(session) = self.idle.lock().await.pop() {
            return Ok(session);
        }
        self.launcher.open_session().await
    }

    async fn checkout_many(&self, count: usize) -> Result<Vec<Box<dyn BrowserSession>>> {
        let mut sessions = Vec::with_capacity(count);
        for _ in 0..count {
            match self.checkout().await {
                Ok(session) => sessions.push(session),
                Err(e) => {
                    self.idle.lock().await.extend(sessions);
                    return Err(e);
                }
            }
        }
        Ok(sessions)
    }

    async fn checkin(&self, session: Box<dyn BrowserSession>) {
        self.idle.lock().await.push(session);
    }
}

/// Placeholder fetcher type for runs that skip discovery.
struct NoFetch;

#[async_trait::async_trait]
impl ListingFetch for NoFetch {
    async fn fetch(&self, url: &url::Url) -> Result<crate::listing::ListingResponse> {
        Err(crate::error::ScrapeError::transport(url.as_str(), "discovery is disabled"))
    }
}
