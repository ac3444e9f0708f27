//! MCP tool implementations.
//!
//! This module contains all tools exposed by the precache server.

pub mod cache;
pub mod theme;

pub use cache::{CacheFetchParams, activate_impl, fetch_impl, install_impl, status_impl};
pub use theme::{ThemeGetParams, ThemeSetParams, theme_get_impl, theme_set_impl};

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;
use precache_core::Error;

/// Serialize a tool output as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
