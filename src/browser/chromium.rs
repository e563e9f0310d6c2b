//! Chromium sessions over the DevTools protocol, via chromiumoxide.

use super::{BrowserSession, SessionLauncher};
use crate::amazon::Locator;
use crate::config::{Config, DEFAULT_USER_AGENT};
use crate::error::{Result, ScrapeError};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Launch options taken from [`Config`].
#[derive(Debug, Clone)]
pub struct ChromiumOptions {
    pub headless: bool,
    pub executable: Option<PathBuf>,
    pub user_agent: String,
}

impl ChromiumOptions {
    pub fn from_config(config: &Config) -> Self {
        let user_agent = config
            .request_headers()
            .into_iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("user-agent"))
            .map(|(_, value)| value)
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

        Self { headless: config.headless, executable: config.chrome_path.clone(), user_agent }
    }

    fn browser_config(&self) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .window_size(1920, 1080)
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg(format!("--user-agent={}", self.user_agent));

        if !self.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }

        builder
            .build()
            .map_err(|e| ScrapeError::launch(format!("failed to build browser config: {}", e)))
    }
}

struct Running {
    browser: Browser,
    handler: JoinHandle<()>,
}

/// Starts Chromium on first use and hands out one tab per session.
pub struct ChromiumLauncher {
    options: ChromiumOptions,
    running: Mutex<Option<Running>>,
}

impl ChromiumLauncher {
    pub fn new(options: ChromiumOptions) -> Self {
        Self { options, running: Mutex::new(None) }
    }

    async fn launch(&self) -> Result<Running> {
        let config = self.options.browser_config()?;
        info!("Launching Chromium (headless: {})", self.options.headless);

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ScrapeError::launch(format!("failed to launch Chromium: {}", e)))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP handler error: {}", e);
                }
            }
        });

        Ok(Running { browser, handler })
    }
}

#[async_trait]
impl SessionLauncher for ChromiumLauncher {
    async fn open_session(&self) -> Result<Box<dyn BrowserSession>> {
        let mut running = self.running.lock().await;
        if running.is_none() {
            *running = Some(self.launch().await?);
        }

        let Some(state) = running.as_ref() else {
            return Err(ScrapeError::launch("browser is not running"));
        };

        let page = state
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| ScrapeError::launch(format!("failed to open tab: {}", e)))?;

        Ok(Box::new(ChromiumSession { page }))
    }

    async fn shutdown(&self) -> Result<()> {
        let Some(mut state) = self.running.lock().await.take() else {
            return Ok(());
        };

        info!("Closing Chromium");
        let closed = state.browser.close().await;
        if let Err(e) = state.browser.wait().await {
            warn!("Chromium did not exit cleanly: {}", e);
        }
        state.handler.abort();

        closed
            .map(|_| ())
            .map_err(|e| ScrapeError::session(format!("failed to close Chromium: {}", e)))
    }
}

/// One Chromium tab.
pub struct ChromiumSession {
    page: Page,
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        debug!("Navigating to {}", url);
        self.page
            .goto(url)
            .await
            .map(|_| ())
            .map_err(|e| ScrapeError::session(format!("navigation to {} failed: {}", url, e)))
    }

    async fn ready_state(&mut self) -> Result<String> {
        self.page
            .evaluate("document.readyState")
            .await
            .map_err(ScrapeError::session)?
            .into_value::<String>()
            .map_err(ScrapeError::session)
    }

    async fn find_text(&mut self, locator: &Locator) -> Result<Option<String>> {
        // DOM.querySelector reports "no match" as an error; treat every lookup
        // failure as absence and let the caller's wait decide.
        let Ok(element) = self.page.find_element(locator.to_css()).await else {
            return Ok(None);
        };

        let text = element.inner_text().await.map_err(ScrapeError::session)?;
        Ok(Some(text.unwrap_or_default()))
    }

    async fn is_clickable(&mut self, locator: &Locator) -> Result<Option<bool>> {
        let Ok(element) = self.page.find_element(locator.to_css()).await else {
            return Ok(None);
        };

        let disabled = element
            .attribute("disabled")
            .await
            .map_err(ScrapeError::session)?
            .is_some();
        let has_point = element.clickable_point().await.is_ok();

        Ok(Some(has_point && !disabled))
    }

    async fn click(&mut self, locator: &Locator) -> Result<()> {
        let element = self
            .page
            .find_element(locator.to_css())
            .await
            .map_err(|e| ScrapeError::session(format!("{} vanished before click: {}", locator, e)))?;

        element.click().await.map_err(ScrapeError::session)?;
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.page.close().await.map_err(ScrapeError::session)
    }
}
