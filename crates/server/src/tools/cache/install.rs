//! cache_install tool implementation.
//!
//! Populates the current generation from the manifest.

use precache_client::AssetCache;
use rmcp::{ErrorData as McpError, model::CallToolResult};

use crate::tools::json_result;

/// Implementation of the cache_install tool.
pub async fn install_impl(cache: &AssetCache) -> Result<CallToolResult, McpError> {
    let report = cache.install().await?;
    json_result(&report)
}
