//! Amazon storefronts: domains, request language, and number conventions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Supported Amazon storefronts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Us,
    Uk,
    De,
    Fr,
    Es,
    It,
    Ca,
    Au,
    Jp,
    #[default]
    In,
    Br,
    Mx,
    Nl,
    Se,
    Pl,
}

impl Region {
    /// Short code used in configuration and on the command line.
    pub fn code(&self) -> &'static str {
        match self {
            Region::Us => "us",
            Region::Uk => "uk",
            Region::De => "de",
            Region::Fr => "fr",
            Region::Es => "es",
            Region::It => "it",
            Region::Ca => "ca",
            Region::Au => "au",
            Region::Jp => "jp",
            Region::In => "in",
            Region::Br => "br",
            Region::Mx => "mx",
            Region::Nl => "nl",
            Region::Se => "se",
            Region::Pl => "pl",
        }
    }

    /// Returns the storefront domain.
    pub fn domain(&self) -> &'static str {
        match self {
            Region::Us => "amazon.com",
            Region::Uk => "amazon.co.uk",
            Region::De => "amazon.de",
            Region::Fr => "amazon.fr",
            Region::Es => "amazon.es",
            Region::It => "amazon.it",
            Region::Ca => "amazon.ca",
            Region::Au => "amazon.com.au",
            Region::Jp => "amazon.co.jp",
            Region::In => "amazon.in",
            Region::Br => "amazon.com.br",
            Region::Mx => "amazon.com.mx",
            Region::Nl => "amazon.nl",
            Region::Se => "amazon.se",
            Region::Pl => "amazon.pl",
        }
    }

    /// Returns the storefront root, e.g. `https://www.amazon.in`.
    pub fn base_url(&self) -> String {
        format!("https://www.{}", self.domain())
    }

    /// Builds the first search-results URL for `query` on this storefront.
    pub fn search_url(&self, query: &str) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&self.base_url())?.join("/s")?;
        url.query_pairs_mut().append_pair("k", query);
        Ok(url)
    }

    /// Accept-Language header sent with listing requests.
    pub fn accept_language(&self) -> &'static str {
        match self {
            Region::Us | Region::Ca | Region::Au => "en-US,en;q=0.9",
            Region::Uk => "en-GB,en;q=0.9",
            Region::In => "en-IN,en;q=0.9,hi;q=0.8",
            Region::De => "de-DE,de;q=0.9,en;q=0.8",
            Region::Fr => "fr-FR,fr;q=0.9,en;q=0.8",
            Region::Es | Region::Mx => "es-ES,es;q=0.9,en;q=0.8",
            Region::It => "it-IT,it;q=0.9,en;q=0.8",
            Region::Jp => "ja-JP,ja;q=0.9,en;q=0.8",
            Region::Br => "pt-BR,pt;q=0.9,en;q=0.8",
            Region::Nl => "nl-NL,nl;q=0.9,en;q=0.8",
            Region::Se => "sv-SE,sv;q=0.9,en;q=0.8",
            Region::Pl => "pl-PL,pl;q=0.9,en;q=0.8",
        }
    }

    /// Whether prices on this storefront are written `1.234,56`.
    pub fn uses_comma_decimal(&self) -> bool {
        matches!(
            self,
            Region::De
                | Region::Fr
                | Region::Es
                | Region::It
                | Region::Nl
                | Region::Se
                | Region::Pl
                | Region::Br
        )
    }

    /// Returns all supported storefronts.
    pub fn all() -> &'static [Region] {
        &[
            Region::Us,
            Region::Uk,
            Region::De,
            Region::Fr,
            Region::Es,
            Region::It,
            Region::Ca,
            Region::Au,
            Region::Jp,
            Region::In,
            Region::Br,
            Region::Mx,
            Region::Nl,
            Region::Se,
            Region::Pl,
        ]
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Region {
    type Err = RegionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        let alias = match needle.as_str() {
            "usa" | "united states" => Some(Region::Us),
            "gb" | "united kingdom" => Some(Region::Uk),
            "india" => Some(Region::In),
            "germany" => Some(Region::De),
            "japan" => Some(Region::Jp),
            _ => None,
        };

        alias
            .or_else(|| {
                Region::all()
                    .iter()
                    .copied()
                    .find(|r| r.code() == needle || r.domain() == needle)
            })
            .ok_or_else(|| RegionParseError(s.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct RegionParseError(String);

impl fmt::Display for RegionParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let codes: Vec<_> = Region::all().iter().map(Region::code).collect();
        write!(f, "Unknown region '{}'. Valid regions: {}", self.0, codes.join(", "))
    }
}

impl std::error::Error for RegionParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_parsing() {
        assert_eq!(Region::from_str("in").unwrap(), Region::In);
        assert_eq!(Region::from_str("India").unwrap(), Region::In);
        assert_eq!(Region::from_str("amazon.in").unwrap(), Region::In);
        assert_eq!(Region::from_str("US").unwrap(), Region::Us);
        assert_eq!(Region::from_str("gb").unwrap(), Region::Uk);
        assert_eq!(Region::from_str(" de ").unwrap(), Region::De);

        assert!(Region::from_str("invalid").is_err());
        assert!(Region::from_str("").is_err());
    }

    #[test]
    fn test_code_roundtrips_through_from_str() {
        for region in Region::all() {
            assert_eq!(Region::from_str(region.code()).unwrap(), *region);
        }
    }

    #[test]
    fn test_base_url() {
        assert_eq!(Region::In.base_url(), "https://www.amazon.in");
        assert_eq!(Region::Uk.base_url(), "https://www.amazon.co.uk");
    }

    #[test]
    fn test_search_url_encodes_query() {
        let url = Region::In.search_url("wireless headphones").unwrap();
        assert_eq!(url.as_str(), "https://www.amazon.in/s?k=wireless+headphones");
    }

    #[test]
    fn test_comma_decimal() {
        assert!(!Region::In.uses_comma_decimal());
        assert!(!Region::Us.uses_comma_decimal());
        assert!(Region::De.uses_comma_decimal());
        assert!(Region::Br.uses_comma_decimal());
    }

    #[test]
    fn test_accept_language() {
        assert!(Region::In.accept_language().starts_with("en-IN"));
        assert!(Region::De.accept_language().starts_with("de-DE"));
    }

    #[test]
    fn test_region_default_is_india() {
        assert_eq!(Region::default(), Region::In);
    }

    #[test]
    fn test_region_parse_error_display() {
        let msg = Region::from_str("xyz").unwrap_err().to_string();
        assert!(msg.contains("xyz"));
        assert!(msg.contains("in, br"));
    }

    #[test]
    fn test_region_serde() {
        assert_eq!(serde_json::to_string(&Region::In).unwrap(), "\"in\"");
        let parsed: Region = serde_json::from_str("\"uk\"").unwrap();
        assert_eq!(parsed, Region::Uk);
    }
}
