//! The static asset cache: a versioned, cache-first request handler.
//!
//! ### Lifecycle
//! - **install**: fetch every manifest URL concurrently; store the batch as one
//!   generation only if every fetch succeeded with a 2xx status.
//! - **activate**: delete every stored generation whose label differs from the
//!   current one. Safe to repeat.
//! - **fetch**: serve from the serving generation on a hit and go to the
//!   network on a miss. Network results are never written back.
//!
//! The serving generation is the current one once activated. Until then the
//! newest generation left behind by an earlier activation keeps serving, also
//! after a failed install; with none stored every request goes to the network.
//! A re-activation keeps serving the current generation throughout.
//! Storage failures while serving degrade to a miss.

pub mod manifest;

pub use manifest::Manifest;

use std::sync::Arc;

use futures_util::future::join_all;
use precache_core::{CacheDb, CapturedResponse, Error, GenerationInfo, WorkerState};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};

use crate::fetch::{Fetcher, normalize};

/// Where a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    Cache,
    Network,
}

/// A response handed back to the requester.
#[derive(Debug, Clone)]
pub struct Served {
    pub response: CapturedResponse,
    pub source: ResponseSource,
}

#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub version: String,
    pub entries: usize,
    /// True when the generation was already stored and nothing was fetched.
    pub resumed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivateReport {
    pub version: String,
    pub deleted: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStatus {
    pub state: WorkerState,
    pub version: String,
    pub manifest_len: usize,
    /// Generation answering requests, if any.
    pub serving: Option<String>,
    pub generations: Vec<GenerationInfo>,
}

/// Cache-first asset cache owning its storage handle and fetcher.
pub struct AssetCache {
    db: CacheDb,
    fetcher: Arc<dyn Fetcher>,
    manifest: Manifest,
    state: RwLock<WorkerState>,
    serving: RwLock<Option<String>>,
    /// Serializes install and activate.
    lifecycle: Mutex<()>,
}

impl AssetCache {
    pub fn new(db: CacheDb, fetcher: Arc<dyn Fetcher>, manifest: Manifest) -> Self {
        Self {
            db,
            fetcher,
            manifest,
            state: RwLock::new(WorkerState::Parsed),
            serving: RwLock::new(None),
            lifecycle: Mutex::new(()),
        }
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    pub fn version(&self) -> &str {
        self.manifest.version()
    }

    /// Label of the generation currently answering requests.
    pub async fn serving(&self) -> Option<String> {
        self.serving.read().await.clone()
    }

    /// Register the cache with storage.
    ///
    /// If a generation with the current label is already stored, it is adopted
    /// without refetching and the cache moves to `Waiting`. Otherwise this is a
    /// normal install.
    pub async fn register(&self) -> Result<InstallReport, Error> {
        let _guard = self.lifecycle.lock().await;

        let generations = self.db.generation_info().await?;
        self.keep_previous_serving(&generations).await;
        let existing = generations.into_iter().find(|g| g.name == self.version());

        match existing {
            Some(generation) => {
                self.advance(WorkerState::Installing).await?;
                self.advance(WorkerState::Waiting).await?;
                tracing::info!(
                    version = %generation.name,
                    entries = generation.entry_count,
                    "generation already installed; skipping fetch"
                );
                Ok(InstallReport {
                    version: generation.name,
                    entries: generation.entry_count as usize,
                    resumed: true,
                })
            }
            None => self.install_locked().await,
        }
    }

    /// Fetch the whole manifest and store it as the current generation.
    ///
    /// # Errors
    ///
    /// - `Error::InstallFailure` if any URL fails or returns a non-2xx status;
    ///   nothing is stored and the cache becomes `Redundant`
    /// - `Error::InvalidTransition` if the cache is not `Parsed` or `Redundant`
    pub async fn install(&self) -> Result<InstallReport, Error> {
        let _guard = self.lifecycle.lock().await;
        if self.serving.read().await.is_none() {
            match self.db.generation_info().await {
                Ok(generations) => self.keep_previous_serving(&generations).await,
                Err(e) => tracing::warn!("could not look up previous generation: {e}"),
            }
        }
        self.install_locked().await
    }

    /// Let the newest stored generation other than the current one serve until
    /// activation. Generations are ordered oldest first.
    async fn keep_previous_serving(&self, generations: &[GenerationInfo]) {
        let previous = generations.iter().rev().find(|g| g.name != self.version());
        let mut serving = self.serving.write().await;
        if serving.is_none()
            && let Some(previous) = previous
        {
            tracing::info!(generation = %previous.name, "previous generation keeps serving until activation");
            *serving = Some(previous.name.clone());
        }
    }

    async fn install_locked(&self) -> Result<InstallReport, Error> {
        self.advance(WorkerState::Installing).await?;
        tracing::info!(version = %self.version(), urls = self.manifest.urls().len(), "installing");

        let fetches = self.manifest.urls().iter().map(|url| async move {
            let result = self.fetcher.fetch(url).await;
            (url, result)
        });
        let results = join_all(fetches).await;

        let mut entries = Vec::with_capacity(results.len());
        for (url, result) in results {
            match result {
                Ok(mut response) if response.is_success() => {
                    response.url = url.to_string();
                    entries.push(response);
                }
                Ok(response) => {
                    return self
                        .fail_install(Error::InstallFailure {
                            url: url.to_string(),
                            reason: format!("status {}", response.status_code),
                        })
                        .await;
                }
                Err(e) => {
                    return self
                        .fail_install(Error::InstallFailure { url: url.to_string(), reason: e.to_string() })
                        .await;
                }
            }
        }

        let written = match self.db.put_generation(self.version(), &entries).await {
            Ok(written) => written,
            Err(e) => return self.fail_install(e).await,
        };

        self.advance(WorkerState::Waiting).await?;
        tracing::info!(version = %self.version(), entries = written, "installed");

        Ok(InstallReport { version: self.version().to_string(), entries: written, resumed: false })
    }

    async fn fail_install(&self, err: Error) -> Result<InstallReport, Error> {
        tracing::warn!(version = %self.version(), "install failed: {err}");
        self.advance(WorkerState::Redundant).await?;
        Err(err)
    }

    /// Delete every generation other than the current one and start serving.
    ///
    /// Deletions run concurrently and are awaited together. If any fails the
    /// cache stays in its previous state and the error is returned; running
    /// activation again retries the remaining deletions.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        let _guard = self.lifecycle.lock().await;

        let previous = self.advance(WorkerState::Activating).await?;

        let stale = match self.db.list_generations().await {
            Ok(names) => names.into_iter().filter(|name| name != self.version()).collect::<Vec<_>>(),
            Err(e) => {
                self.rollback(previous).await;
                return Err(e);
            }
        };

        let deletions = stale.iter().map(|name| async move { (name, self.db.delete_generation(name).await) });
        let mut deleted = Vec::with_capacity(stale.len());
        let mut first_error = None;
        for (name, result) in join_all(deletions).await {
            match result {
                Ok(true) => deleted.push(name.clone()),
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(generation = %name, "failed to delete stale generation: {e}");
                    first_error.get_or_insert(e);
                }
            }
        }

        if let Some(e) = first_error {
            self.rollback(previous).await;
            return Err(e);
        }

        self.advance(WorkerState::Active).await?;
        *self.serving.write().await = Some(self.version().to_string());
        tracing::info!(version = %self.version(), deleted = ?deleted, "activated");

        Ok(ActivateReport { version: self.version().to_string(), deleted })
    }

    /// Handle one intercepted request.
    ///
    /// `request` is an absolute URL or a path relative to the site origin.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidUrl` if the request cannot be normalized
    /// - whatever the fetcher returns on a miss, unchanged
    pub async fn fetch(&self, request: &str) -> Result<Served, Error> {
        let url = normalize(request, self.manifest.origin()).map_err(|e| Error::InvalidUrl(e.to_string()))?;

        if let Some(generation) = self.serving().await {
            match self.db.match_entry(&generation, url.as_str()).await {
                Ok(Some(response)) => {
                    tracing::debug!(generation = %generation, "cache hit for {}", url);
                    return Ok(Served { response, source: ResponseSource::Cache });
                }
                Ok(None) => tracing::debug!("cache miss for {}", url),
                Err(e) => {
                    let err = Error::LookupFailure(e.to_string());
                    tracing::warn!("{err}; falling back to network for {url}");
                }
            }
        }

        let response = self.fetcher.fetch(&url).await?;
        Ok(Served { response, source: ResponseSource::Network })
    }

    /// Current state plus every stored generation.
    pub async fn status(&self) -> Result<CacheStatus, Error> {
        Ok(CacheStatus {
            state: self.state().await,
            version: self.version().to_string(),
            manifest_len: self.manifest.urls().len(),
            serving: self.serving().await,
            generations: self.db.generation_info().await?,
        })
    }

    /// Move to `next`, returning the state left behind.
    async fn advance(&self, next: WorkerState) -> Result<WorkerState, Error> {
        let mut state = self.state.write().await;
        let previous = *state;
        *state = previous.transition(next)?;
        tracing::debug!(from = %previous, to = %next, "lifecycle transition");
        Ok(previous)
    }

    /// Undo an aborted activation. Bypasses the transition guard.
    async fn rollback(&self, previous: WorkerState) {
        let mut state = self.state.write().await;
        let aborted = *state;
        tracing::debug!(from = %aborted, to = %previous, "activation rolled back");
        *state = previous;
    }
}
