//! Add-to-cart simulation on a product page.

use crate::amazon::{InteractionResult, Locator};
use crate::browser::{wait_for_clickable, BrowserSession, ClickWait, WaitPolicy};
use crate::config::Config;
use tracing::{info, warn};

/// Clicks the add-to-cart control once. Never fails the caller.
#[derive(Debug, Clone)]
pub struct InteractionSimulator {
    control: Locator,
    wait: WaitPolicy,
}

impl InteractionSimulator {
    pub fn new(control: Locator, wait: WaitPolicy) -> Self {
        Self { control, wait }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.selectors.add_to_cart.clone(),
            WaitPolicy::new(config.click_timeout(), config.poll_interval()),
        )
    }

    /// Navigates to `url` and clicks the add-to-cart control if it becomes
    /// clickable in time. Every outcome is logged.
    pub async fn add_to_cart(&self, session: &mut dyn BrowserSession, url: &str) -> InteractionResult {
        let result = self.attempt(session, url).await;
        match &result {
            InteractionResult::Succeeded => info!("Product added to cart successfully ({})", url),
            other => warn!("Could not add product to the cart ({}): {}", url, other),
        }
        result
    }

    async fn attempt(&self, session: &mut dyn BrowserSession, url: &str) -> InteractionResult {
        if let Err(e) = session.navigate(url).await {
            return InteractionResult::Failed(e.to_string());
        }

        match wait_for_clickable(session, &self.control, self.wait).await {
            Ok(ClickWait::Ready) => match session.click(&self.control).await {
                Ok(()) => InteractionResult::Succeeded,
                Err(e) => InteractionResult::Failed(e.to_string()),
            },
            Ok(ClickWait::NeverPresent) => InteractionResult::ControlNotFound,
            Ok(ClickWait::NeverClickable) => InteractionResult::TimedOut,
            Err(e) => InteractionResult::Failed(e.to_string()),
        }
    }
}
