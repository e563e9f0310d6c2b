//! Browser automation seam.
//!
//! `SessionLauncher` and `BrowserSession` abstract over the browser engine
//! (Chromium via chromiumoxide). Waiting is not part of the session API; the
//! polling helpers in [`wait`] build presence, clickability, and page-ready
//! conditions on top of the single-shot queries here.

pub mod chromium;
pub mod wait;

#[cfg(test)]
pub(crate) mod mock;

pub use chromium::{ChromiumLauncher, ChromiumOptions};
pub use wait::{wait_for_clickable, wait_for_presence, wait_until_ready, ClickWait, WaitPolicy};

use crate::amazon::Locator;
use crate::error::Result;
use async_trait::async_trait;

/// A single browser tab. Owned by one worker at a time.
#[async_trait]
pub trait BrowserSession: Send {
    /// Loads `url` in this tab.
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// Current `document.readyState`.
    async fn ready_state(&mut self) -> Result<String>;

    /// Text of the first element matching `locator`, `None` if nothing matches.
    async fn find_text(&mut self, locator: &Locator) -> Result<Option<String>>;

    /// Whether the first match can receive a click; `None` if nothing matches.
    async fn is_clickable(&mut self, locator: &Locator) -> Result<Option<bool>>;

    /// Clicks the first element matching `locator`.
    async fn click(&mut self, locator: &Locator) -> Result<()>;

    /// Closes the tab.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Hands out browser sessions. Implementations start the browser lazily, on
/// the first `open_session` call.
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    /// Opens a new tab, launching the browser if needed.
    async fn open_session(&self) -> Result<Box<dyn BrowserSession>>;

    /// Shuts the browser down. A no-op if it was never launched.
    async fn shutdown(&self) -> Result<()>;
}
