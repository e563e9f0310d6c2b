//! amz-scout - Two-stage Amazon product pipeline
//!
//! Listing pages are fetched over HTTP and parsed for product URLs, which are
//! saved to a CSV manifest. Each product page is then rendered in Chromium and
//! its title, price, and review count are extracted into a second CSV.

pub mod amazon;
pub mod browser;
pub mod commands;
pub mod config;
pub mod error;
pub mod extract;
pub mod format;
pub mod listing;
pub mod pipeline;
pub mod store;
pub mod throttle;

pub use amazon::{FieldValue, ProductRecord, Region};
pub use config::Config;
pub use error::ScrapeError;
pub use pipeline::{Pipeline, Stage};
