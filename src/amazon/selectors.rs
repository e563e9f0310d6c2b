//! Site selectors for listing and product pages.
//!
//! Amazon changes its markup without notice, so every selector lives in
//! configuration. The defaults below are what the storefront serves today.
//!
//! **Update process**: when a field starts coming back unavailable for every
//! product, capture the page HTML, fix the selector in `[selectors]`, and add
//! a fixture.

use crate::error::{Result, ScrapeError};
use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a browser element is located.
///
/// Written in configuration as `id:productTitle`, `class:a-price-whole`, or
/// `css:.a-size-base .a-color-base`. A bare string is treated as CSS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Locator {
    Id(String),
    Class(String),
    Css(String),
}

impl Locator {
    /// Returns the equivalent CSS selector.
    pub fn to_css(&self) -> String {
        match self {
            Locator::Id(id) => format!("#{}", id),
            Locator::Class(class) => class
                .split_whitespace()
                .map(|c| format!(".{}", c))
                .collect::<String>(),
            Locator::Css(css) => css.clone(),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Id(v) => write!(f, "id:{}", v),
            Locator::Class(v) => write!(f, "class:{}", v),
            Locator::Css(v) => write!(f, "css:{}", v),
        }
    }
}

impl FromStr for Locator {
    type Err = ScrapeError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let locator = match s.split_once(':') {
            Some(("id", v)) => Locator::Id(v.trim().to_string()),
            Some(("class", v)) => Locator::Class(v.trim().to_string()),
            Some(("css", v)) => Locator::Css(v.trim().to_string()),
            _ => Locator::Css(s.to_string()),
        };

        let css = locator.to_css();
        if css.trim().is_empty() || css == "#" {
            return Err(ScrapeError::Config(format!("empty locator '{}'", s)));
        }
        Selector::parse(&css)
            .map_err(|e| ScrapeError::Config(format!("bad locator '{}': {}", s, e)))?;

        Ok(locator)
    }
}

impl TryFrom<String> for Locator {
    type Error = ScrapeError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Locator> for String {
    fn from(locator: Locator) -> Self {
        locator.to_string()
    }
}

/// Site-defined coupling points, all overridable from `[selectors]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSelectors {
    /// Anchor marking a product link on a search-results page (CSS).
    pub listing_link: String,
    /// Product title on the detail page.
    pub title: Locator,
    /// Whole part of the displayed price.
    pub price: Locator,
    /// Review count text.
    pub reviews: Locator,
    /// "Add to cart" button.
    pub add_to_cart: Locator,
}

impl Default for SiteSelectors {
    fn default() -> Self {
        Self {
            listing_link: "a.a-link-normal.s-no-outline".to_string(),
            title: Locator::Id("productTitle".to_string()),
            price: Locator::Class("a-price-whole".to_string()),
            reviews: Locator::Css(".a-size-base .a-color-base".to_string()),
            add_to_cart: Locator::Id("add-to-cart-button".to_string()),
        }
    }
}

impl SiteSelectors {
    /// Compiles the listing-link selector, restricted to anchors with an href.
    pub fn listing_link_selector(&self) -> Result<Selector> {
        let css = self
            .listing_link
            .split(',')
            .map(|part| format!("{}[href]", part.trim()))
            .collect::<Vec<_>>()
            .join(", ");

        Selector::parse(&css).map_err(|e| {
            ScrapeError::Config(format!("bad listing_link selector '{}': {}", self.listing_link, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn test_locator_to_css() {
        assert_eq!(Locator::Id("productTitle".into()).to_css(), "#productTitle");
        assert_eq!(Locator::Class("a-price-whole".into()).to_css(), ".a-price-whole");
        assert_eq!(
            Locator::Class("a-link-normal s-no-outline".into()).to_css(),
            ".a-link-normal.s-no-outline"
        );
        assert_eq!(Locator::Css("div > span".into()).to_css(), "div > span");
    }

    #[test]
    fn test_locator_parse() {
        assert_eq!("id:productTitle".parse::<Locator>().unwrap(), Locator::Id("productTitle".into()));
        assert_eq!(
            "class: a-price-whole".parse::<Locator>().unwrap(),
            Locator::Class("a-price-whole".into())
        );
        assert_eq!(
            ".a-size-base .a-color-base".parse::<Locator>().unwrap(),
            Locator::Css(".a-size-base .a-color-base".into())
        );
    }

    #[test]
    fn test_locator_parse_rejects_garbage() {
        assert!("id:".parse::<Locator>().is_err());
        assert!("css:[[[".parse::<Locator>().is_err());
    }

    #[test]
    fn test_locator_display_roundtrip() {
        let locator = Locator::Css(".a-size-base .a-color-base".into());
        assert_eq!(locator.to_string().parse::<Locator>().unwrap(), locator);
    }

    #[test]
    fn test_selectors_from_toml() {
        let toml = r#"
            listing_link = "a.product-link"
            title = "css:h1.title"
        "#;
        let selectors: SiteSelectors = toml::from_str(toml).unwrap();
        assert_eq!(selectors.listing_link, "a.product-link");
        assert_eq!(selectors.title, Locator::Css("h1.title".into()));
        assert_eq!(selectors.price, SiteSelectors::default().price);
    }

    #[test]
    fn test_listing_link_requires_href() {
        let selector = SiteSelectors::default().listing_link_selector().unwrap();
        let html = Html::parse_document(
            r#"<a class="a-link-normal s-no-outline" href="/dp/B1">one</a>
               <a class="a-link-normal s-no-outline">no href</a>
               <a class="a-link-normal" href="/dp/B2">other class</a>"#,
        );
        assert_eq!(html.select(&selector).count(), 1);
    }
}
