//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (PRECACHE_*)
//! 2. TOML config file (if PRECACHE_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! The manifest and the cache version label are deploy-time inputs: change the
//! label whenever the manifest changes, or stale assets keep being served.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (PRECACHE_*)
/// 2. TOML config file (if PRECACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to SQLite cache database.
    ///
    /// Set via PRECACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Label of the current cache generation.
    ///
    /// Set via PRECACHE_CACHE_VERSION environment variable.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Origin that relative manifest entries and request paths resolve against.
    ///
    /// Set via PRECACHE_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Resources pre-populated on install, in order.
    ///
    /// Set via PRECACHE_MANIFEST environment variable or the `manifest` array
    /// in the TOML file.
    #[serde(default = "default_manifest")]
    pub manifest: Vec<String>,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via PRECACHE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via PRECACHE_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via PRECACHE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum redirects followed per request.
    ///
    /// Set via PRECACHE_MAX_REDIRECTS environment variable.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Promote a freshly installed generation immediately.
    ///
    /// Set via PRECACHE_AUTO_ACTIVATE environment variable.
    #[serde(default = "default_true")]
    pub auto_activate: bool,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./precache.sqlite")
}

fn default_cache_version() -> String {
    "portfolio-v1".into()
}

fn default_origin() -> String {
    "http://localhost:3000".into()
}

fn default_manifest() -> Vec<String> {
    [
        "/",
        "/static/css/main.css",
        "/static/js/main.js",
        "/static/media/dp.png",
        "/static/media/backdrop.svg",
        "https://fonts.googleapis.com/css2?family=Poppins:wght@300;400;500;600;700&display=swap",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_user_agent() -> String {
    "precache/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_redirects() -> usize {
    5
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            cache_version: default_cache_version(),
            origin: default_origin(),
            manifest: default_manifest(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            max_redirects: default_max_redirects(),
            auto_activate: true,
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `PRECACHE_`
    /// 2. TOML file from `PRECACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("PRECACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("PRECACHE_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
