//! HTTP client for search-results pages.

use crate::config::Config;
use crate::error::{Result, ScrapeError};
use crate::throttle::Throttle;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;
use wreq::Client;

/// Raw HTTP response for one listing page.
#[derive(Debug, Clone)]
pub struct ListingResponse {
    pub status: u16,
    pub body: String,
}

/// Fetches listing pages - enables mocking for tests.
#[async_trait]
pub trait ListingFetch: Send + Sync {
    /// Issues a GET and returns status and body. Non-2xx statuses are not
    /// errors at this layer; only transport failures are.
    async fn fetch(&self, url: &Url) -> Result<ListingResponse>;
}

/// Listing fetcher over `wreq` with a static header set and throttling.
pub struct HttpFetcher {
    client: Client,
    headers: BTreeMap<String, String>,
    throttle: Arc<Throttle>,
}

impl HttpFetcher {
    /// Creates a fetcher from the configuration's headers, proxy, and delay.
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10));

        if let Some(proxy_url) = &config.proxy {
            debug!("Configuring proxy: {}", proxy_url);
            let proxy = wreq::Proxy::all(proxy_url)
                .map_err(|e| ScrapeError::Config(format!("bad proxy '{}': {}", proxy_url, e)))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| ScrapeError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            headers: config.request_headers(),
            throttle: Arc::new(Throttle::from_millis(config.delay_ms)),
        })
    }

    /// Shares `throttle` with other request sources, such as browser navigations.
    pub fn with_throttle(mut self, throttle: Arc<Throttle>) -> Self {
        self.throttle = throttle;
        self
    }
}

#[async_trait]
impl ListingFetch for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<ListingResponse> {
        self.throttle.acquire().await;

        debug!("GET {}", url);

        let mut request = self.client.get(url.as_str());
        for (name, value) in &self.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response =
            request.send().await.map_err(|e| ScrapeError::transport(url.as_str(), e))?;

        let status = response.status().as_u16();
        debug!("Response status: {}", status);

        let body = response
            .text()
            .await
            .map_err(|e| ScrapeError::transport(url.as_str(), format!("reading body: {}", e)))?;

        Ok(ListingResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_test_config() -> Config {
        Config { delay_ms: 0, ..Config::default() }
    }

    #[tokio::test]
    async fn test_fetch_success_sends_headers() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/s"))
            .and(query_param("page", "1"))
            .and(header("Accept-Language", "en-IN,en;q=0.9,hi;q=0.8"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new(&make_test_config()).unwrap();
        let url = Url::parse(&format!("{}/s?k=test&page=1", mock_server.uri())).unwrap();

        let response = fetcher.fetch(&url).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, "<html>ok</html>");
    }

    #[tokio::test]
    async fn test_fetch_custom_user_agent() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(header("User-Agent", "amz-scout-test"))
            .respond_with(ResponseTemplate::new(200).set_body_string("matched"))
            .mount(&mock_server)
            .await;

        let mut config = make_test_config();
        config.headers.insert("User-Agent".to_string(), "amz-scout-test".to_string());
        let fetcher = HttpFetcher::new(&config).unwrap();
        let url = Url::parse(&mock_server.uri()).unwrap();

        let response = fetcher.fetch(&url).await.unwrap();
        assert_eq!(response.body, "matched");
    }

    #[tokio::test]
    async fn test_fetch_non_success_is_not_an_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new(&make_test_config()).unwrap();
        let url = Url::parse(&format!("{}/s", mock_server.uri())).unwrap();

        let response = fetcher.fetch(&url).await.unwrap();
        assert_eq!(response.status, 503);
    }

    #[tokio::test]
    async fn test_fetch_waits_on_shared_throttle() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&mock_server)
            .await;

        let throttle = Arc::new(Throttle::from_millis(150));
        let fetcher =
            HttpFetcher::new(&make_test_config()).unwrap().with_throttle(Arc::clone(&throttle));
        let url = Url::parse(&mock_server.uri()).unwrap();

        // Another request source claims the slot first.
        throttle.acquire().await;
        let start = std::time::Instant::now();
        fetcher.fetch(&url).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused_is_transport_error() {
        let fetcher = HttpFetcher::new(&make_test_config()).unwrap();
        let url = Url::parse("http://127.0.0.1:9/s").unwrap();

        let err = fetcher.fetch(&url).await.unwrap_err();
        assert!(matches!(err, ScrapeError::Transport { .. }));
        assert!(err.to_string().contains("127.0.0.1:9"));
    }
}
