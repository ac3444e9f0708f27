//! Cache lifecycle MCP tools.
//!
//! One tool per lifecycle entry point (install, activate, fetch) plus a
//! read-only status view.

pub mod activate;
pub mod fetch;
pub mod install;
pub mod status;

pub use activate::activate_impl;
pub use fetch::{CacheFetchParams, fetch_impl};
pub use install::install_impl;
pub use status::status_impl;
