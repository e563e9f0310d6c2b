//! Single-field extraction with a locator + timeout policy.
//!
//! Nothing here returns an error. Every failure, whether a missing element,
//! unparseable text, or a browser hiccup, becomes `FieldValue::Unavailable`
//! with the cause attached, and is logged with the URL and field name.

use crate::amazon::{FieldValue, Locator, UnavailableReason};
use crate::browser::{wait_for_presence, BrowserSession, WaitPolicy};
use crate::config::Config;
use crate::error::ScrapeError;
use regex_lite::Regex;
use std::fmt;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Characters kept from a price on period-decimal storefronts.
static PRICE_NOISE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\d.]").unwrap());

/// Characters kept from a price on comma-decimal storefronts.
static PRICE_NOISE_COMMA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\d,]").unwrap());

/// First run of digits, allowing thousands groups ("12,345", "1.234") and
/// Indian lakh grouping ("1,23,456").
static FIRST_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{1,3}(?:,\d{2})*(?:,\d{3})+|\d+(?:[,.]\d{3})*").unwrap()
});

/// The fields read from a product page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Title,
    Price,
    Reviews,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Title => write!(f, "title"),
            FieldKind::Price => write!(f, "price"),
            FieldKind::Reviews => write!(f, "reviews"),
        }
    }
}

/// Where a field lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPolicy {
    pub locator: Locator,
    pub wait: WaitPolicy,
}

/// Reads title, price, and review count from a rendered product page.
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    title: FieldPolicy,
    price: FieldPolicy,
    reviews: FieldPolicy,
    comma_decimal: bool,
}

impl FieldExtractor {
    pub fn new(
        title: FieldPolicy,
        price: FieldPolicy,
        reviews: FieldPolicy,
        comma_decimal: bool,
    ) -> Self {
        Self { title, price, reviews, comma_decimal }
    }

    /// Builds the extractor from configured selectors and timeouts.
    pub fn from_config(config: &Config) -> Self {
        let wait = WaitPolicy::new(config.field_timeout(), config.poll_interval());
        let policy = |locator: &Locator| FieldPolicy { locator: locator.clone(), wait };

        Self::new(
            policy(&config.selectors.title),
            policy(&config.selectors.price),
            policy(&config.selectors.reviews),
            config.region.uses_comma_decimal(),
        )
    }

    pub fn policy(&self, kind: FieldKind) -> &FieldPolicy {
        match kind {
            FieldKind::Title => &self.title,
            FieldKind::Price => &self.price,
            FieldKind::Reviews => &self.reviews,
        }
    }

    pub async fn title(&self, session: &mut dyn BrowserSession, url: &str) -> FieldValue<String> {
        self.extract(session, url, FieldKind::Title, normalize_title).await
    }

    pub async fn price(&self, session: &mut dyn BrowserSession, url: &str) -> FieldValue<f64> {
        let comma_decimal = self.comma_decimal;
        self.extract(session, url, FieldKind::Price, |text| normalize_price(text, comma_decimal))
            .await
    }

    pub async fn reviews(&self, session: &mut dyn BrowserSession, url: &str) -> FieldValue<u32> {
        self.extract(session, url, FieldKind::Reviews, normalize_review_count).await
    }

    async fn extract<T>(
        &self,
        session: &mut dyn BrowserSession,
        url: &str,
        kind: FieldKind,
        normalize: impl Fn(&str) -> Option<T>,
    ) -> FieldValue<T> {
        let policy = self.policy(kind);

        let reason = match wait_for_presence(session, &policy.locator, policy.wait).await {
            Ok(text) => match normalize(&text) {
                Some(value) => {
                    debug!("{} {}: {:?}", url, kind, text.trim());
                    return FieldValue::Present(value);
                }
                None => UnavailableReason::Unparseable { text: text.trim().to_string() },
            },
            Err(ScrapeError::ElementTimeout { locator, timeout }) => {
                UnavailableReason::NotFound { locator, timeout }
            }
            Err(e) => UnavailableReason::Session(e.to_string()),
        };

        warn!("Error extracting {} from {}: {}", kind, url, reason);
        FieldValue::Unavailable(reason)
    }
}

/// Trims whitespace; an empty title counts as unparseable.
pub fn normalize_title(text: &str) -> Option<String> {
    let title = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!title.is_empty()).then_some(title)
}

/// Strips currency symbols and separators, then parses a decimal.
///
/// `"₹1,299."` → 1299.0; with `comma_decimal`, `"1.234,56 €"` → 1234.56.
pub fn normalize_price(text: &str, comma_decimal: bool) -> Option<f64> {
    let cleaned = if comma_decimal {
        PRICE_NOISE_COMMA.replace_all(text, "").replace(',', ".")
    } else {
        PRICE_NOISE.replace_all(text, "").into_owned()
    };

    let cleaned = cleaned.trim_end_matches('.');
    if cleaned.is_empty() {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Extracts the first number in `text`, folding thousands separators.
///
/// `"1,234 ratings"` → 1234; `"4.5 out of 5"` → 4.
pub fn normalize_review_count(text: &str) -> Option<u32> {
    let digits: String = FIRST_NUMBER
        .find(text)?
        .as_str()
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();

    digits.parse().ok()
}
