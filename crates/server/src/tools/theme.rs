//! theme_get / theme_set tool implementations.
//!
//! Reads and writes the persisted light/dark preference.

use precache_core::{CacheDb, ThemeMode};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Parameters for the theme_get tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ThemeGetParams {
    /// Whether the visitor's system prefers a dark color scheme.
    /// Used only when no theme has been saved.
    #[serde(default)]
    pub system_prefers_dark: bool,
}

/// Parameters for the theme_set tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ThemeSetParams {
    pub theme: ThemeMode,
}

/// Output from the theme tools.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ThemeOutput {
    /// Effective theme.
    pub theme: ThemeMode,
    /// Class to put on the document root; the other one is removed.
    pub class_name: String,
    /// Whether the theme came from a saved preference.
    pub saved: bool,
}

impl ThemeOutput {
    fn new(theme: ThemeMode, saved: bool) -> Self {
        Self { theme, class_name: theme.class_name().to_string(), saved }
    }
}

/// Implementation of the theme_get tool.
pub async fn theme_get_impl(db: &CacheDb, params: ThemeGetParams) -> Result<CallToolResult, McpError> {
    let saved = db.get_theme().await?;
    let theme = ThemeMode::resolve(saved, params.system_prefers_dark);
    json_result(&ThemeOutput::new(theme, saved.is_some()))
}

/// Implementation of the theme_set tool.
pub async fn theme_set_impl(db: &CacheDb, params: ThemeSetParams) -> Result<CallToolResult, McpError> {
    db.set_theme(params.theme).await?;
    tracing::debug!(theme = %params.theme, "theme saved");
    json_result(&ThemeOutput::new(params.theme, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::result_json;

    #[tokio::test]
    async fn test_get_follows_system_when_unset() {
        let db = CacheDb::open_in_memory().await.unwrap();

        let output = result_json(&theme_get_impl(&db, ThemeGetParams { system_prefers_dark: true }).await.unwrap());
        assert_eq!(output["theme"], "dark");
        assert_eq!(output["saved"], false);

        let output = result_json(&theme_get_impl(&db, ThemeGetParams::default()).await.unwrap());
        assert_eq!(output["theme"], "light");
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let db = CacheDb::open_in_memory().await.unwrap();
        theme_set_impl(&db, ThemeSetParams { theme: ThemeMode::Light }).await.unwrap();

        let output = result_json(&theme_get_impl(&db, ThemeGetParams { system_prefers_dark: true }).await.unwrap());
        assert_eq!(output["theme"], "light");
        assert_eq!(output["class_name"], "light");
        assert_eq!(output["saved"], true);
    }

    #[test]
    fn test_set_params_parse() {
        let params: ThemeSetParams = serde_json::from_str(r#"{"theme":"dark"}"#).unwrap();
        assert_eq!(params.theme, ThemeMode::Dark);
        assert!(serde_json::from_str::<ThemeSetParams>(r#"{"theme":"sepia"}"#).is_err());
    }
}
