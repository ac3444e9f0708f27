//! cache_activate tool implementation.
//!
//! Deletes stale generations and starts serving from the current one.

use precache_client::AssetCache;
use rmcp::{ErrorData as McpError, model::CallToolResult};

use crate::tools::json_result;

/// Implementation of the cache_activate tool.
pub async fn activate_impl(cache: &AssetCache) -> Result<CallToolResult, McpError> {
    let report = cache.activate().await?;
    json_result(&report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{make_cache, result_json};

    #[tokio::test]
    async fn test_activate_deletes_stale() {
        let (db, cache) = make_cache(&["/"]).await;
        db.put_generation("portfolio-v0", &[]).await.unwrap();
        cache.install().await.unwrap();

        let result = activate_impl(&cache).await.unwrap();
        let output = result_json(&result);
        assert_eq!(output["deleted"], serde_json::json!(["portfolio-v0"]));
        assert_eq!(db.list_generations().await.unwrap(), vec!["portfolio-v1".to_string()]);
    }

    #[tokio::test]
    async fn test_activate_before_install_fails() {
        let (_db, cache) = make_cache(&["/"]).await;
        let err = activate_impl(&cache).await.unwrap_err();
        assert_eq!(err.code.0, -32023);
    }
}
