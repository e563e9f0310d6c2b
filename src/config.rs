//! Configuration management with TOML, environment variables, and CLI overrides.

use crate::amazon::{Region, SiteSelectors};
use crate::error::ScrapeError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Desktop Chrome user agent sent with listing requests.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36";

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Amazon storefront
    #[serde(default)]
    pub region: Region,

    /// Search query used to build the listing URL
    #[serde(default = "default_query")]
    pub query: String,

    /// Full search URL; overrides `region` + `query` when set
    #[serde(default)]
    pub search_url: Option<String>,

    /// Number of listing pages to discover
    #[serde(default = "default_pages")]
    pub pages: u32,

    /// CSV manifest of discovered product URLs
    #[serde(default = "default_manifest_path")]
    pub manifest_path: PathBuf,

    /// CSV file receiving extracted product records
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,

    /// Run the add-to-cart interaction after extraction
    #[serde(default = "default_true")]
    pub simulate: bool,

    /// Drop repeated URLs during discovery
    #[serde(default)]
    pub dedup: bool,

    /// Minimum delay between requests in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Browser sessions used during extraction
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Wait budget for each field's element, in seconds
    #[serde(default = "default_field_timeout_secs")]
    pub field_timeout_secs: u64,

    /// Wait budget for `document.readyState == "complete"`, in seconds
    #[serde(default = "default_settle_timeout_secs")]
    pub settle_timeout_secs: u64,

    /// Wait budget for the add-to-cart control, in seconds
    #[serde(default = "default_click_timeout_secs")]
    pub click_timeout_secs: u64,

    /// Budget for one product page end to end, in seconds
    #[serde(default = "default_page_timeout_secs")]
    pub page_timeout_secs: u64,

    /// Polling interval for browser waits in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Run Chromium without a window
    #[serde(default = "default_true")]
    pub headless: bool,

    /// Chromium executable; auto-detected when unset
    #[serde(default)]
    pub chrome_path: Option<PathBuf>,

    /// Static proxy URL (e.g., socks5://host:port)
    #[serde(default)]
    pub proxy: Option<String>,

    /// Output format for stage summaries
    #[serde(default)]
    pub format: OutputFormat,

    /// Extra or replacement request headers for listing requests
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Site selectors
    #[serde(default)]
    pub selectors: SiteSelectors,
}

fn default_query() -> String {
    "wireless headphones".to_string()
}

fn default_pages() -> u32 {
    2
}

fn default_manifest_path() -> PathBuf {
    PathBuf::from("amazon_product_urls.csv")
}

fn default_output_path() -> PathBuf {
    PathBuf::from("amazon_product_details.csv")
}

fn default_true() -> bool {
    true
}

fn default_delay_ms() -> u64 {
    2000
}

fn default_workers() -> usize {
    1
}

fn default_field_timeout_secs() -> u64 {
    10
}

fn default_settle_timeout_secs() -> u64 {
    10
}

fn default_click_timeout_secs() -> u64 {
    10
}

fn default_page_timeout_secs() -> u64 {
    90
}

fn default_poll_interval_ms() -> u64 {
    250
}

impl Default for Config {
    fn default() -> Self {
        Self {
            region: Region::default(),
            query: default_query(),
            search_url: None,
            pages: default_pages(),
            manifest_path: default_manifest_path(),
            output_path: default_output_path(),
            simulate: true,
            dedup: false,
            delay_ms: default_delay_ms(),
            workers: default_workers(),
            field_timeout_secs: default_field_timeout_secs(),
            settle_timeout_secs: default_settle_timeout_secs(),
            click_timeout_secs: default_click_timeout_secs(),
            page_timeout_secs: default_page_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            headless: true,
            chrome_path: None,
            proxy: None,
            format: OutputFormat::default(),
            headers: BTreeMap::new(),
            selectors: SiteSelectors::default(),
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        let local_config = Path::new("amz-scout.toml");
        if local_config.exists() {
            debug!("Found amz-scout.toml in current directory");
            return Self::from_file(local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("amz-scout").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides. Unparseable values are ignored.
    pub fn with_env(mut self) -> Self {
        if let Some(region) = env_parse("AMZ_REGION") {
            self.region = region;
        }
        if let Some(delay) = env_parse("AMZ_DELAY") {
            self.delay_ms = delay;
        }
        if let Some(workers) = env_parse("AMZ_WORKERS") {
            self.workers = workers;
        }
        if let Ok(proxy) = std::env::var("AMZ_PROXY") {
            self.proxy = Some(proxy);
        }
        if let Ok(chrome) = std::env::var("AMZ_CHROME") {
            self.chrome_path = Some(PathBuf::from(chrome));
        }

        self
    }

    /// Rejects values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ScrapeError> {
        if self.pages == 0 {
            return Err(ScrapeError::Config("pages must be at least 1".to_string()));
        }
        if self.workers == 0 {
            return Err(ScrapeError::Config("workers must be at least 1".to_string()));
        }
        if self.poll_interval_ms == 0 {
            return Err(ScrapeError::Config("poll_interval_ms must be positive".to_string()));
        }
        self.search_base_url()?;
        self.selectors.listing_link_selector()?;
        Ok(())
    }

    /// Search-results URL that pagination is appended to.
    pub fn search_base_url(&self) -> Result<Url, ScrapeError> {
        match &self.search_url {
            Some(raw) => Url::parse(raw)
                .map_err(|e| ScrapeError::Config(format!("bad search_url '{}': {}", raw, e))),
            None => self
                .region
                .search_url(&self.query)
                .map_err(|e| ScrapeError::Config(format!("bad search url: {}", e))),
        }
    }

    /// Listing request headers: storefront defaults overlaid with `headers`.
    pub fn request_headers(&self) -> BTreeMap<String, String> {
        let mut headers = BTreeMap::from([
            ("User-Agent".to_string(), DEFAULT_USER_AGENT.to_string()),
            (
                "Accept".to_string(),
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8".to_string(),
            ),
            ("Accept-Language".to_string(), self.region.accept_language().to_string()),
        ]);

        for (name, value) in &self.headers {
            headers.retain(|k, _| !k.eq_ignore_ascii_case(name));
            headers.insert(name.clone(), value.clone());
        }
        headers
    }

    pub fn field_timeout(&self) -> Duration {
        Duration::from_secs(self.field_timeout_secs)
    }

    pub fn settle_timeout(&self) -> Duration {
        Duration::from_secs(self.settle_timeout_secs)
    }

    pub fn click_timeout(&self) -> Duration {
        Duration::from_secs(self.click_timeout_secs)
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

/// Output format for stage summaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(format!("Unknown format: {}. Use: table, json, markdown", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amazon::Locator;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.region, Region::In);
        assert_eq!(config.pages, 2);
        assert!(config.simulate);
        assert!(!config.dedup);
        assert_eq!(config.workers, 1);
        assert_eq!(config.manifest_path, PathBuf::from("amazon_product_urls.csv"));
        assert_eq!(config.output_path, PathBuf::from("amazon_product_details.csv"));
        assert_eq!(config.field_timeout(), Duration::from_secs(10));
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("table".parse::<OutputFormat>().unwrap(), OutputFormat::Table);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);

        let err = "csv".parse::<OutputFormat>().unwrap_err();
        assert!(err.contains("Unknown format"));
    }

    #[test]
    fn test_output_format_display() {
        assert_eq!(OutputFormat::Table.to_string(), "table");
        assert_eq!(OutputFormat::Json.to_string(), "json");
        assert_eq!(OutputFormat::Markdown.to_string(), "markdown");
    }

    #[test]
    fn test_config_from_toml_all_fields() {
        let toml = r#"
            region = "uk"
            query = "usb c hub"
            pages = 5
            manifest_path = "out/urls.csv"
            output_path = "out/details.csv"
            simulate = false
            dedup = true
            delay_ms = 500
            workers = 3
            field_timeout_secs = 4
            page_timeout_secs = 30
            headless = false
            format = "json"

            [headers]
            "User-Agent" = "amz-scout-test"

            [selectors]
            title = "css:h1#title"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.region, Region::Uk);
        assert_eq!(config.query, "usb c hub");
        assert_eq!(config.pages, 5);
        assert_eq!(config.manifest_path, PathBuf::from("out/urls.csv"));
        assert!(!config.simulate);
        assert!(config.dedup);
        assert_eq!(config.workers, 3);
        assert_eq!(config.field_timeout(), Duration::from_secs(4));
        assert_eq!(config.settle_timeout(), Duration::from_secs(10));
        assert!(!config.headless);
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.selectors.title, Locator::Css("h1#title".into()));
        assert_eq!(config.selectors.price, Locator::Class("a-price-whole".into()));
        assert_eq!(config.request_headers()["User-Agent"], "amz-scout-test");
    }

    #[test]
    fn test_config_rejects_bad_locator() {
        let toml = r#"
            [selectors]
            price = "css:[[["
        "#;
        assert!(toml::from_str::<Config>(toml).is_err());
    }

    #[test]
    fn test_validate() {
        let mut config = Config::default();
        config.pages = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.workers = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.search_url = Some("not a url".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_search_base_url() {
        let config = Config::default();
        assert_eq!(
            config.search_base_url().unwrap().as_str(),
            "https://www.amazon.in/s?k=wireless+headphones"
        );

        let mut config = Config::default();
        config.search_url = Some("https://www.amazon.in/s?k=mouse&ref=nb_sb_noss_2".to_string());
        assert_eq!(config.search_base_url().unwrap().query(), Some("k=mouse&ref=nb_sb_noss_2"));
    }

    #[test]
    fn test_request_headers_override_case_insensitive() {
        let mut config = Config::default();
        config.headers.insert("user-agent".to_string(), "custom".to_string());
        config.headers.insert("X-Extra".to_string(), "1".to_string());

        let headers = config.request_headers();
        assert_eq!(headers.get("user-agent").map(String::as_str), Some("custom"));
        assert!(!headers.contains_key("User-Agent"));
        assert_eq!(headers["X-Extra"], "1");
        assert_eq!(headers["Accept-Language"], Region::In.accept_language());
    }

    #[test]
    fn test_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            region = "de"
            pages = 3
            "#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.region, Region::De);
        assert_eq!(config.pages, 3);
    }

    #[test]
    fn test_config_from_file_not_found() {
        let err = Config::from_file("/nonexistent/path/config.toml").unwrap_err().to_string();
        assert!(err.contains("Failed to read config file"));
    }

    #[test]
    fn test_config_from_file_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid toml {{{{").unwrap();

        let err = Config::from_file(file.path()).unwrap_err().to_string();
        assert!(err.contains("Failed to parse config file"));
    }

    #[test]
    fn test_config_load_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "workers = 4").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.workers, 4);
    }

    #[test]
    fn test_config_with_env() {
        let orig_region = std::env::var("AMZ_REGION").ok();
        let orig_workers = std::env::var("AMZ_WORKERS").ok();

        std::env::set_var("AMZ_REGION", "jp");
        std::env::set_var("AMZ_WORKERS", "not_a_number");

        let config = Config::new().with_env();
        assert_eq!(config.region, Region::Jp);
        assert_eq!(config.workers, 1);

        match orig_region {
            Some(v) => std::env::set_var("AMZ_REGION", v),
            None => std::env::remove_var("AMZ_REGION"),
        }
        match orig_workers {
            Some(v) => std::env::set_var("AMZ_WORKERS", v),
            None => std::env::remove_var("AMZ_WORKERS"),
        }
    }
}
