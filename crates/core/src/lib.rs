//! Core types and shared functionality for precache.
//!
//! This crate provides:
//! - Generation storage with SQLite backend
//! - Worker lifecycle states
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod lifecycle;

pub use cache::{CacheDb, CapturedResponse, GenerationInfo, ThemeMode};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use lifecycle::WorkerState;
