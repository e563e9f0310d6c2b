//! Browser-side extraction: product fields and the cart interaction.

pub mod detail;
pub mod field;
pub mod interact;

pub use detail::DetailScraper;
pub use field::{FieldExtractor, FieldKind, FieldPolicy};
pub use interact::InteractionSimulator;
