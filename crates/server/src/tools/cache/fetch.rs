//! cache_fetch tool implementation.
//!
//! Routes one request through the asset cache: stored response on a hit,
//! live network response on a miss.

use precache_client::{AssetCache, ResponseSource};
use precache_core::{CapturedResponse, Error};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::tools::json_result;

/// Parameters for the cache_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheFetchParams {
    /// Absolute URL or a path relative to the site origin (e.g. "/static/js/main.js").
    pub url: String,
}

/// Output from the cache_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheFetchOutput {
    /// The normalized URL that was looked up.
    pub url: String,
    /// "cache" or "network".
    pub source: String,
    pub status_code: u16,
    /// Response headers as received.
    pub headers: Vec<(String, String)>,
    /// ISO8601 timestamp of when the response was fetched.
    pub fetched_at: String,
    /// Body as text, when the response is text-like and valid UTF-8.
    pub body_text: Option<String>,
    pub body_bytes: usize,
    /// Hex SHA-256 of the body.
    pub body_sha256: String,
}

impl CacheFetchOutput {
    fn new(response: CapturedResponse, source: ResponseSource) -> Self {
        let body_sha256 = hex::encode(Sha256::digest(&response.body));
        let body_text = if is_text_like(response.content_type()) {
            String::from_utf8(response.body.clone()).ok()
        } else {
            None
        };
        let source = match source {
            ResponseSource::Cache => "cache",
            ResponseSource::Network => "network",
        };

        Self {
            url: response.url,
            source: source.to_string(),
            status_code: response.status_code,
            headers: response.headers,
            fetched_at: response.fetched_at,
            body_text,
            body_bytes: response.body.len(),
            body_sha256,
        }
    }
}

fn is_text_like(content_type: Option<&str>) -> bool {
    let Some(content_type) = content_type else {
        return false;
    };
    let mime = content_type.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    mime.starts_with("text/")
        || mime.ends_with("+xml")
        || mime.ends_with("+json")
        || matches!(mime.as_str(), "application/json" | "application/javascript" | "application/xml")
}

/// Implementation of the cache_fetch tool.
pub async fn fetch_impl(cache: &AssetCache, params: CacheFetchParams) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()).into());
    }

    let served = cache.fetch(&params.url).await?;
    json_result(&CacheFetchOutput::new(served.response, served.source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{make_cache, result_json};

    #[test]
    fn test_is_text_like() {
        assert!(is_text_like(Some("text/html; charset=utf-8")));
        assert!(is_text_like(Some("image/svg+xml")));
        assert!(is_text_like(Some("application/javascript")));
        assert!(!is_text_like(Some("image/png")));
        assert!(!is_text_like(None));
    }

    #[tokio::test]
    async fn test_fetch_hit_returns_text_body() {
        let (_db, cache) = make_cache(&["/", "/static/media/dp.png"]).await;
        cache.install().await.unwrap();
        cache.activate().await.unwrap();

        let output = result_json(&fetch_impl(&cache, CacheFetchParams { url: "/".into() }).await.unwrap());
        assert_eq!(output["source"], "cache");
        assert_eq!(output["status_code"], 200);
        assert_eq!(output["body_text"], "<html>portfolio</html>");
    }

    #[tokio::test]
    async fn test_fetch_binary_body_omits_text() {
        let (_db, cache) = make_cache(&["/", "/static/media/dp.png"]).await;
        cache.install().await.unwrap();
        cache.activate().await.unwrap();

        let params = CacheFetchParams { url: "/static/media/dp.png".into() };
        let output = result_json(&fetch_impl(&cache, params).await.unwrap());
        assert_eq!(output["source"], "cache");
        assert!(output["body_text"].is_null());
        assert_eq!(output["body_bytes"], 5);
        assert_eq!(output["body_sha256"].as_str().unwrap().len(), 64);
    }

    #[tokio::test]
    async fn test_fetch_miss_network_failure() {
        let (_db, cache) = make_cache(&["/"]).await;
        cache.install().await.unwrap();
        cache.activate().await.unwrap();

        let err = fetch_impl(&cache, CacheFetchParams { url: "/blogs".into() }).await.unwrap_err();
        assert_eq!(err.code.0, -32022);
    }

    #[tokio::test]
    async fn test_fetch_empty_url() {
        let (_db, cache) = make_cache(&["/"]).await;
        let result = fetch_impl(&cache, CacheFetchParams { url: " ".into() }).await;
        assert!(result.is_err());
    }
}
