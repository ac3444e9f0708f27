//! Unified error types for precache.
//!
//! Every variant renders with a stable code prefix so tool callers can match
//! on it without parsing free-form text.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

use crate::lifecycle::WorkerState;

/// Unified error types for the asset cache.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty URL).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// A manifest URL could not be fetched or returned a non-success status.
    ///
    /// Nothing from the batch is stored and the generation is not created.
    #[error("INSTALL_FAILED: {url}: {reason}")]
    InstallFailure { url: String, reason: String },

    /// Reading from cache storage failed.
    ///
    /// Never surfaced from request handling, where it degrades to a miss.
    #[error("LOOKUP_FAILED: {0}")]
    LookupFailure(String),

    /// Network fetch failed on a cache miss.
    #[error("NETWORK_ERROR: {0}")]
    NetworkFailure(String),

    /// Fetch response too large.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Lifecycle transition not allowed from the current state.
    #[error("INVALID_TRANSITION: {from} -> {to}")]
    InvalidTransition { from: WorkerState, to: WorkerState },

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Stored row could not be decoded.
    #[error("CACHE_ERROR: corrupt entry: {0}")]
    CorruptEntry(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let code = match &err {
            Error::InvalidInput(_) => -32602,
            Error::InstallFailure { .. } => -32020,
            Error::LookupFailure(_) => -32021,
            Error::NetworkFailure(_) => -32022,
            Error::FetchTooLarge(_) => -32007,
            Error::InvalidUrl(_) => -32003,
            Error::InvalidTransition { .. } => -32023,
            Error::Database(_) | Error::MigrationFailed(_) | Error::CorruptEntry(_) => -32002,
        };

        McpError { code: ErrorCode(code), message: err.to_string().into(), data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InstallFailure { url: "https://example.com/a.css".to_string(), reason: "status 404".into() };
        assert!(err.to_string().starts_with("INSTALL_FAILED"));
        assert!(err.to_string().contains("a.css"));
        assert!(err.to_string().contains("status 404"));
    }

    #[test]
    fn test_transition_display() {
        let err = Error::InvalidTransition { from: WorkerState::Parsed, to: WorkerState::Active };
        assert_eq!(err.to_string(), "INVALID_TRANSITION: parsed -> active");
    }

    #[test]
    fn test_error_to_mcp_error() {
        let err = Error::NetworkFailure("connection refused".to_string());
        let mcp_err: McpError = err.into();
        assert_eq!(mcp_err.code.0, -32022);
        assert!(mcp_err.message.contains("connection refused"));
    }
}
