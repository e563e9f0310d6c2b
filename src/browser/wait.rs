//! Wait-for-condition primitives over a [`BrowserSession`].

use super::BrowserSession;
use crate::amazon::Locator;
use crate::error::{Result, ScrapeError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

/// How long to wait and how often to re-check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub timeout: Duration,
    pub poll: Duration,
}

impl WaitPolicy {
    pub fn new(timeout: Duration, poll: Duration) -> Self {
        Self { timeout, poll }
    }
}

/// Outcome of waiting for a control to become clickable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickWait {
    Ready,
    /// Nothing matched the locator for the whole wait.
    NeverPresent,
    /// The element was seen but never accepted clicks.
    NeverClickable,
}

/// Sleeps until the next poll, or returns false once the deadline passed.
async fn tick(deadline: Instant, poll: Duration) -> bool {
    let now = Instant::now();
    if now >= deadline {
        return false;
    }
    tokio::time::sleep(poll.min(deadline - now)).await;
    true
}

/// Waits for `locator` to match and returns the element's text.
///
/// The condition is checked at least once, even with a zero timeout.
pub async fn wait_for_presence(
    session: &mut dyn BrowserSession,
    locator: &Locator,
    policy: WaitPolicy,
) -> Result<String> {
    let deadline = Instant::now() + policy.timeout;

    loop {
        if let Some(text) = session.find_text(locator).await? {
            return Ok(text);
        }
        trace!("{} not present yet", locator);
        if !tick(deadline, policy.poll).await {
            return Err(ScrapeError::ElementTimeout {
                locator: locator.to_string(),
                timeout: policy.timeout,
            });
        }
    }
}

/// Waits for `locator` to match an element that accepts clicks.
pub async fn wait_for_clickable(
    session: &mut dyn BrowserSession,
    locator: &Locator,
    policy: WaitPolicy,
) -> Result<ClickWait> {
    let deadline = Instant::now() + policy.timeout;
    let mut seen = false;

    loop {
        match session.is_clickable(locator).await? {
            Some(true) => return Ok(ClickWait::Ready),
            Some(false) => seen = true,
            None => {}
        }
        if !tick(deadline, policy.poll).await {
            return Ok(if seen { ClickWait::NeverClickable } else { ClickWait::NeverPresent });
        }
    }
}

/// Waits for `document.readyState` to reach `complete`.
pub async fn wait_until_ready(session: &mut dyn BrowserSession, policy: WaitPolicy) -> Result<()> {
    let deadline = Instant::now() + policy.timeout;

    loop {
        let state = session.ready_state().await?;
        if state == "complete" {
            return Ok(());
        }
        trace!("readyState is {:?}", state);
        if !tick(deadline, policy.poll).await {
            return Err(ScrapeError::ElementTimeout {
                locator: "document.readyState == \"complete\"".to_string(),
                timeout: policy.timeout,
            });
        }
    }
}
