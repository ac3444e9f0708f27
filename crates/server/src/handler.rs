//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use precache_client::AssetCache;
use precache_core::CacheDb;

use crate::tools::{
    CacheFetchParams, ThemeGetParams, ThemeSetParams, activate_impl, fetch_impl, install_impl, status_impl,
    theme_get_impl, theme_set_impl,
};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for precache.
#[derive(Clone)]
pub struct PrecacheServer {
    tool_router: ToolRouter<Self>,
    cache: Arc<AssetCache>,
    db: CacheDb,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl PrecacheServer {
    /// Create a new server handler around a registered cache.
    pub fn new(cache: Arc<AssetCache>, db: CacheDb) -> Self {
        Self { tool_router: Self::tool_router(), cache, db }
    }

    #[tool(description = "Fetch every manifest URL and store them as the current cache generation. \
                          Fails without storing anything if any URL fails.")]
    async fn cache_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.cache).await
    }

    #[tool(description = "Delete every cache generation except the current one and start serving from it.")]
    async fn cache_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.cache).await
    }

    /// Fetch a resource through the cache.
    ///
    /// Stored responses are returned without touching the network; misses are
    /// fetched live and not stored.
    #[tool(description = "Fetch a URL through the asset cache. Returns the stored response on a hit, \
                          or the live network response on a miss.")]
    async fn cache_fetch(&self, params: Parameters<CacheFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.cache, params.0).await
    }

    #[tool(description = "Show the cache lifecycle state and the stored generations.")]
    async fn cache_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.cache).await
    }

    #[tool(description = "Get the effective light/dark theme.")]
    async fn theme_get(&self, params: Parameters<ThemeGetParams>) -> Result<CallToolResult, McpError> {
        theme_get_impl(&self.db, params.0).await
    }

    #[tool(description = "Save the light/dark theme preference.")]
    async fn theme_set(&self, params: Parameters<ThemeSetParams>) -> Result<CallToolResult, McpError> {
        theme_set_impl(&self.db, params.0).await
    }
}

impl ServerHandler for PrecacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "precache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::make_cache;

    #[tokio::test]
    async fn test_all_tools_registered() {
        let (db, cache) = make_cache(&["/"]).await;
        let server = PrecacheServer::new(cache, db);

        let mut names: Vec<String> = server.tool_router.list_all().into_iter().map(|t| t.name.to_string()).collect();
        names.sort();
        assert_eq!(
            names,
            vec!["cache_activate", "cache_fetch", "cache_install", "cache_status", "theme_get", "theme_set"]
        );
    }

    #[tokio::test]
    async fn test_server_info() {
        let (db, cache) = make_cache(&["/"]).await;
        let server = PrecacheServer::new(cache, db);
        assert_eq!(server.get_info().server_info.name, "precache");
    }
}
