//! Error taxonomy for the scraping pipeline.
//!
//! Scope matters more than kind here: transport, session and element errors
//! are recoverable at page or field level. Launch, manifest, persistence and
//! config errors stop the stage.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by the listing, browser, and persistence layers.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Network or HTTP-level failure for a single page.
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// A browser wait ran out before its condition held.
    #[error("timed out after {}ms waiting for {locator}", .timeout.as_millis())]
    ElementTimeout { locator: String, timeout: Duration },

    /// The browser could not be started or would not open a tab.
    #[error("browser launch failed: {0}")]
    Launch(String),

    /// A tab misbehaved while in use.
    #[error("browser session error: {0}")]
    Session(String),

    /// The manifest file does not exist.
    #[error("manifest not found: {}", .0.display())]
    ManifestNotFound(PathBuf),

    /// A manifest or output file could not be read or written.
    #[error("persistence error for {}: {message}", .path.display())]
    Persistence { path: PathBuf, message: String },

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ScrapeError {
    /// Builds a transport error for `url`.
    pub fn transport(url: impl Into<String>, message: impl ToString) -> Self {
        Self::Transport { url: url.into(), message: message.to_string() }
    }

    /// Builds a persistence error for `path`.
    pub fn persistence(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Persistence { path: path.into(), message: message.to_string() }
    }

    /// Builds a browser session error.
    pub fn session(message: impl ToString) -> Self {
        Self::Session(message.to_string())
    }

    /// Builds a browser launch error.
    pub fn launch(message: impl ToString) -> Self {
        Self::Launch(message.to_string())
    }

    /// Returns true when the error should stop the whole stage.
    pub fn is_batch_fatal(&self) -> bool {
        matches!(
            self,
            Self::Launch(_) | Self::ManifestNotFound(_) | Self::Persistence { .. } | Self::Config(_)
        )
    }
}

pub type Result<T, E = ScrapeError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ScrapeError::transport("https://example.com/s?page=1", "connection reset");
        assert_eq!(
            err.to_string(),
            "request to https://example.com/s?page=1 failed: connection reset"
        );

        let err = ScrapeError::ElementTimeout {
            locator: "#productTitle".to_string(),
            timeout: Duration::from_secs(10),
        };
        assert_eq!(err.to_string(), "timed out after 10000ms waiting for #productTitle");

        let err = ScrapeError::ManifestNotFound(PathBuf::from("urls.csv"));
        assert_eq!(err.to_string(), "manifest not found: urls.csv");
    }

    #[test]
    fn test_batch_fatal_classification() {
        assert!(ScrapeError::ManifestNotFound(PathBuf::from("x.csv")).is_batch_fatal());
        assert!(ScrapeError::persistence("out.csv", "permission denied").is_batch_fatal());
        assert!(!ScrapeError::transport("u", "m").is_batch_fatal());
        assert!(ScrapeError::launch("no executable").is_batch_fatal());
        assert!(ScrapeError::Config("workers must be at least 1".to_string()).is_batch_fatal());
        assert!(!ScrapeError::session("tab crashed").is_batch_fatal());
        assert!(!ScrapeError::ElementTimeout {
            locator: "#x".to_string(),
            timeout: Duration::from_millis(5)
        }
        .is_batch_fatal());
    }
}
