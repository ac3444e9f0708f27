//! HTTP fetch pipeline for manifest population and cache misses.
//!
//! ### URL Normalization
//! - Trim whitespace, resolve relative locators against the site origin
//! - Lowercase host, remove fragments
//! - Preserve query string
//!
//! ### Limits
//! - Max redirects: 5 (configurable)
//! - Max body bytes: 5MB (configurable)
//!
//! Responses are returned whatever their status; deciding whether a 404 is an
//! error belongs to the caller. Request headers are never rewritten beyond the
//! client's User-Agent.

pub mod url;

use ::url::Url;
use bytes::Bytes;
use precache_core::{AppConfig, CapturedResponse, Error};
use reqwest::{Client, StatusCode, header};
use std::time::{Duration, Instant};

pub use self::url::{UrlError, normalize};

/// Network side of the cache: anything that can turn a URL into a response.
///
/// Transport failures are `Error::NetworkFailure`; HTTP error statuses are
/// ordinary responses.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<CapturedResponse, Error>;
}

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "precache/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "precache/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            max_redirects: config.max_redirects,
        }
    }
}

/// Response from a fetch operation.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// The URL requested
    pub url: Url,
    /// The final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status: StatusCode,
    /// Response body bytes
    pub bytes: Bytes,
    /// Response headers
    pub headers: header::HeaderMap,
    /// Time taken to fetch in milliseconds
    pub fetch_ms: u64,
}

impl FetchResponse {
    /// Capture this response for storage, keyed by the requested URL.
    ///
    /// Headers that are not valid UTF-8 are dropped.
    pub fn capture(&self) -> CapturedResponse {
        let headers = self
            .headers
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
            .collect();

        CapturedResponse {
            url: self.url.to_string(),
            status_code: self.status.as_u16(),
            headers,
            body: self.bytes.to_vec(),
            fetched_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// HTTP fetch client with size and redirect limits.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::NetworkFailure(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Fetch a URL, returning raw bytes and metadata.
    ///
    /// Any HTTP status is returned as a response; only transport errors and
    /// the byte limit fail.
    pub async fn get(&self, url: &Url) -> Result<FetchResponse, Error> {
        let start = Instant::now();

        let response = self
            .http
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| Error::NetworkFailure(format!("{url}: {e}")))?;

        let status = response.status();

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!(
                "{} bytes exceeds {}",
                len, self.config.max_bytes
            )));
        }

        let final_url = response.url().clone();
        let headers = response.headers().clone();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::NetworkFailure(format!("failed to read response from {url}: {e}")))?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!(
                "{} bytes exceeds {}",
                bytes.len(),
                self.config.max_bytes
            )));
        }

        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(
            "fetched {} -> {} ({}) in {}ms ({} bytes)",
            url,
            final_url,
            status.as_u16(),
            fetch_ms,
            bytes.len()
        );

        Ok(FetchResponse { url: url.clone(), final_url, status, bytes, headers, fetch_ms })
    }
}

#[async_trait::async_trait]
impl Fetcher for FetchClient {
    async fn fetch(&self, url: &Url) -> Result<CapturedResponse, Error> {
        let response = self.get(url).await?;
        Ok(response.capture())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_response() -> FetchResponse {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, header::HeaderValue::from_static("image/svg+xml"));
        headers.insert(header::ETAG, header::HeaderValue::from_static("\"abc\""));
        FetchResponse {
            url: Url::parse("http://localhost:3000/static/media/backdrop.svg").unwrap(),
            final_url: Url::parse("http://localhost:3000/static/media/backdrop.svg").unwrap(),
            status: StatusCode::OK,
            bytes: Bytes::from_static(b"<svg/>"),
            headers,
            fetch_ms: 12,
        }
    }

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.user_agent, "precache/0.1");
        assert_eq!(config.max_bytes, 5 * 1024 * 1024);
        assert_eq!(config.timeout, Duration::from_millis(20000));
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_fetch_config_from_app_config() {
        let app = AppConfig { user_agent: "portfolio-sw".into(), timeout_ms: 500, ..Default::default() };
        let config = FetchConfig::from(&app);
        assert_eq!(config.user_agent, "portfolio-sw");
        assert_eq!(config.timeout, Duration::from_millis(500));
    }

    #[test]
    fn test_capture_keeps_status_headers_body() {
        let captured = make_response().capture();
        assert_eq!(captured.url, "http://localhost:3000/static/media/backdrop.svg");
        assert_eq!(captured.status_code, 200);
        assert_eq!(captured.content_type(), Some("image/svg+xml"));
        assert_eq!(captured.header("etag"), Some("\"abc\""));
        assert_eq!(captured.body, b"<svg/>");
    }

    #[test]
    fn test_capture_keeps_error_status() {
        let mut response = make_response();
        response.status = StatusCode::NOT_FOUND;
        let captured = response.capture();
        assert_eq!(captured.status_code, 404);
        assert!(!captured.is_success());
    }

    #[tokio::test]
    async fn test_fetch_client_new() {
        let client = FetchClient::new(FetchConfig::default());
        assert!(client.is_ok());
    }

    #[tokio::test]
    #[ignore = "requires network"]
    async fn test_fetch_font_stylesheet() {
        let client = FetchClient::new(FetchConfig::default()).unwrap();
        let url = Url::parse("https://fonts.googleapis.com/css2?family=Poppins:wght@400&display=swap").unwrap();
        let captured = client.fetch(&url).await.unwrap();
        assert!(captured.is_success());
    }
}
