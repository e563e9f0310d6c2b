//! In-memory browser for tests.

use super::{BrowserSession, SessionLauncher};
use crate::amazon::Locator;
use crate::error::{Result, ScrapeError};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Elements on one fake page, keyed by CSS selector.
#[derive(Debug, Clone, Default)]
pub struct MockPage {
    pub text: HashMap<String, String>,
    pub clickable: HashMap<String, bool>,
}

impl MockPage {
    pub fn with_text(mut self, css: &str, text: &str) -> Self {
        self.text.insert(css.to_string(), text.to_string());
        self
    }

    pub fn with_control(mut self, css: &str, clickable: bool) -> Self {
        self.clickable.insert(css.to_string(), clickable);
        self
    }
}

/// Shared state behind every session a [`MockLauncher`] hands out.
#[derive(Debug, Default)]
pub struct MockSite {
    pub pages: HashMap<String, MockPage>,
    /// URLs whose navigation fails
    pub unreachable: HashSet<String>,
    /// URLs whose navigation never completes
    pub hanging: HashSet<String>,
    pub visits: Mutex<Vec<String>>,
    pub clicks: Mutex<Vec<String>>,
}

impl MockSite {
    pub fn page(mut self, url: &str, page: MockPage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    pub fn visits(&self) -> Vec<String> {
        self.visits.lock().unwrap().clone()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.clicks.lock().unwrap().clone()
    }
}

pub struct MockSession {
    site: Arc<MockSite>,
    current: Option<String>,
    closed: Arc<AtomicUsize>,
}

impl MockSession {
    pub fn new(site: Arc<MockSite>) -> Self {
        Self { site, current: None, closed: Arc::new(AtomicUsize::new(0)) }
    }

    fn page(&self) -> Option<&MockPage> {
        self.current.as_ref().and_then(|url| self.site.pages.get(url))
    }
}

#[async_trait]
impl BrowserSession for MockSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.site.visits.lock().unwrap().push(url.to_string());
        if self.site.hanging.contains(url) {
            std::future::pending::<()>().await;
        }
        if self.site.unreachable.contains(url) {
            self.current = None;
            return Err(ScrapeError::session(format!("net::ERR_CONNECTION_RESET at {}", url)));
        }
        self.current = Some(url.to_string());
        Ok(())
    }

    async fn ready_state(&mut self) -> Result<String> {
        Ok("complete".to_string())
    }

    async fn find_text(&mut self, locator: &Locator) -> Result<Option<String>> {
        Ok(self.page().and_then(|p| p.text.get(&locator.to_css()).cloned()))
    }

    async fn is_clickable(&mut self, locator: &Locator) -> Result<Option<bool>> {
        Ok(self.page().and_then(|p| p.clickable.get(&locator.to_css()).copied()))
    }

    async fn click(&mut self, locator: &Locator) -> Result<()> {
        let url = self.current.clone().unwrap_or_default();
        self.site.clicks.lock().unwrap().push(format!("{} {}", url, locator));
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Launcher that counts launches, sessions, and shutdowns.
#[derive(Default)]
pub struct MockLauncher {
    pub site: Arc<MockSite>,
    pub fail_launch: bool,
    pub opened: AtomicUsize,
    pub closed: Arc<AtomicUsize>,
    pub shut_down: AtomicBool,
}

impl MockLauncher {
    pub fn new(site: MockSite) -> Self {
        Self { site: Arc::new(site), ..Default::default() }
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn was_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionLauncher for MockLauncher {
    async fn open_session(&self) -> Result<Box<dyn BrowserSession>> {
        if self.fail_launch {
            return Err(ScrapeError::launch("failed to launch Chromium: no executable"));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        let mut session = MockSession::new(Arc::clone(&self.site));
        session.closed = Arc::clone(&self.closed);
        Ok(Box::new(session))
    }

    async fn shutdown(&self) -> Result<()> {
        self.shut_down.store(true, Ordering::SeqCst);
        Ok(())
    }
}
