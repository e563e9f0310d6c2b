//! CLI command implementations.

pub mod discover;
pub mod extract;
pub mod run;

pub use discover::DiscoverCommand;
pub use extract::ExtractCommand;
pub use run::RunCommand;
