//! Client code for precache.
//!
//! This crate provides the HTTP fetch pipeline and the asset cache component
//! that serves requests from stored generations, shared by the server binary.

pub mod fetch;
pub mod worker;

pub use fetch::{FetchClient, FetchConfig, FetchResponse, Fetcher};
pub use worker::{ActivateReport, AssetCache, CacheStatus, InstallReport, Manifest, ResponseSource, Served};
