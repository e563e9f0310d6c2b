//! Data models for extracted product records.

use serde::{Serialize, Serializer};
use std::fmt;
use std::time::Duration;

/// Marker written to CSV for a field that could not be extracted.
pub const UNAVAILABLE: &str = "N/A";

/// Why a field has no value.
#[derive(Debug, Clone, PartialEq)]
pub enum UnavailableReason {
    /// The locator matched nothing before the wait ran out.
    NotFound { locator: String, timeout: Duration },
    /// The element was there but its text did not normalise to a value.
    Unparseable { text: String },
    /// The browser failed while reading the element.
    Session(String),
    /// The product page never loaded.
    Navigation(String),
    /// The whole page exceeded its time budget.
    PageTimedOut { timeout: Duration },
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { locator, timeout } => {
                write!(f, "{} not found within {}ms", locator, timeout.as_millis())
            }
            Self::Unparseable { text } => write!(f, "could not parse {:?}", text),
            Self::Session(msg) => write!(f, "browser error: {}", msg),
            Self::Navigation(msg) => write!(f, "navigation failed: {}", msg),
            Self::PageTimedOut { timeout } => {
                write!(f, "page exceeded {}s budget", timeout.as_secs())
            }
        }
    }
}

/// One extracted field: a value, or the reason there is none.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<T> {
    Present(T),
    Unavailable(UnavailableReason),
}

impl<T> FieldValue<T> {
    /// Returns the value if present.
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Present(v) => Some(v),
            Self::Unavailable(_) => None,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    /// Returns the failure reason if unavailable.
    pub fn reason(&self) -> Option<&UnavailableReason> {
        match self {
            Self::Present(_) => None,
            Self::Unavailable(r) => Some(r),
        }
    }
}

impl<T: fmt::Display> FieldValue<T> {
    /// Renders the value for a CSV cell, `N/A` when unavailable.
    pub fn cell(&self) -> String {
        match self {
            Self::Present(v) => v.to_string(),
            Self::Unavailable(_) => UNAVAILABLE.to_string(),
        }
    }
}

impl<T: Serialize> Serialize for FieldValue<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Present(v) => v.serialize(serializer),
            Self::Unavailable(_) => serializer.serialize_none(),
        }
    }
}

/// Fields extracted from one product page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRecord {
    /// Source product URL
    pub url: String,
    /// Product title
    pub title: FieldValue<String>,
    /// Price, normalised to a decimal
    pub price: FieldValue<f64>,
    /// Number of reviews
    pub reviews: FieldValue<u32>,
}

impl ProductRecord {
    /// Builds a record with every field unavailable for the same reason.
    pub fn unavailable(url: impl Into<String>, reason: UnavailableReason) -> Self {
        Self {
            url: url.into(),
            title: FieldValue::Unavailable(reason.clone()),
            price: FieldValue::Unavailable(reason.clone()),
            reviews: FieldValue::Unavailable(reason),
        }
    }

    /// Number of fields that were extracted.
    pub fn present_count(&self) -> usize {
        [self.title.is_present(), self.price.is_present(), self.reviews.is_present()]
            .into_iter()
            .filter(|p| *p)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.present_count() == 0
    }
}

/// Outcome of the add-to-cart interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionResult {
    Succeeded,
    /// The control never appeared on the page.
    ControlNotFound,
    /// The control appeared but never became clickable.
    TimedOut,
    /// Navigation or the click itself failed.
    Failed(String),
}

impl fmt::Display for InteractionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded => write!(f, "added to cart"),
            Self::ControlNotFound => write!(f, "add-to-cart control not found"),
            Self::TimedOut => write!(f, "add-to-cart control never became clickable"),
            Self::Failed(msg) => write!(f, "interaction failed: {}", msg),
        }
    }
}
