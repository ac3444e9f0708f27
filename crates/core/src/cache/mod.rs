//! SQLite-backed storage for cache generations.
//!
//! This module replaces browser cache storage with a persistent store using
//! SQLite with async access via tokio-rusqlite. It supports:
//!
//! - Generations keyed by version label, written as one atomic batch
//! - Entries keyed by SHA-256 of the normalized request URL
//! - Whole-generation deletion (entries cascade)
//! - A small key-value table for user preferences
//! - Automatic schema migrations and WAL mode

pub mod connection;
pub mod generations;
pub mod hash;
pub mod migrations;
pub mod preferences;

pub use crate::Error;

pub use connection::CacheDb;
pub use generations::{CapturedResponse, GenerationInfo};
pub use preferences::ThemeMode;
