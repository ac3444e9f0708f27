//! precache server entry point.
//!
//! Boots the asset cache (register, then activate when configured) and serves
//! its lifecycle and theme tools over MCP stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::{Context, Result};
use precache_client::{AssetCache, FetchClient, FetchConfig, Manifest};
use precache_core::{AppConfig, CacheDb};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("loading configuration")?;

    tracing::info!(
        version = %config.cache_version,
        db_path = %config.db_path.display(),
        "Starting precache server on stdio transport"
    );

    let db = CacheDb::open(&config.db_path)
        .await
        .with_context(|| format!("opening cache database {}", config.db_path.display()))?;
    let fetcher = FetchClient::new(FetchConfig::from(&config))?;
    let manifest = Manifest::from_config(&config)?;
    let cache = Arc::new(AssetCache::new(db.clone(), Arc::new(fetcher), manifest));

    boot(&cache, config.auto_activate).await;

    let handler = handler::PrecacheServer::new(cache, db);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}

/// Register the cache and promote it if configured.
///
/// Failures are logged, not fatal: the previous generation, if one is stored,
/// keeps serving and everything else goes to the network.
async fn boot(cache: &AssetCache, auto_activate: bool) {
    match cache.register().await {
        Ok(report) => {
            tracing::info!(version = %report.version, entries = report.entries, resumed = report.resumed, "registered");
        }
        Err(e) => {
            tracing::error!(serving = ?cache.serving().await, "cache registration failed: {e}");
            return;
        }
    }

    if auto_activate && let Err(e) = cache.activate().await {
        tracing::error!("cache activation failed: {e}");
    }
}
