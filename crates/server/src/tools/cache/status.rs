//! cache_status tool implementation.

use precache_client::AssetCache;
use rmcp::{ErrorData as McpError, model::CallToolResult};

use crate::tools::json_result;

/// Implementation of the cache_status tool.
pub async fn status_impl(cache: &AssetCache) -> Result<CallToolResult, McpError> {
    let status = cache.status().await?;
    json_result(&status)
}
