//! Amazon-specific storefront data, selectors, and record models.

pub mod models;
pub mod regions;
pub mod selectors;

pub use models::{FieldValue, InteractionResult, ProductRecord, UnavailableReason};
pub use regions::Region;
pub use selectors::{Locator, SiteSelectors};
