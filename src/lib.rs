//! Taproom - an edge proxy for beer festival data.
//!
//! Taproom sits in front of a static festival data origin and gives browser
//! clients a small, CORS-aware API on top of it:
//!
//! - `GET /health` answers without touching the origin
//! - `GET /festivals` (or `/festivals.json`) serves the festival registry
//! - `GET /{festival_id}/available_beverage_types.json` discovers which
//!   beverage type files a festival publishes by scraping the origin's
//!   directory listing
//! - everything else is relayed to the origin unchanged, with the local CORS
//!   policy applied to the response
//!
//! # Quick Example
//! ```no_run
//! use std::sync::Arc;
//!
//! use taproom::{
//!     adapters::{HttpClientAdapter, ProxyHandler, build_router},
//!     config::ServerConfig,
//!     core::FestivalRegistry,
//! };
//!
//! # #[tokio::main] async fn main() -> eyre::Result<()> {
//! let config: ServerConfig = taproom::config::load_config("config.toml").await?;
//! let registry = Arc::new(FestivalRegistry::load(config.registry.override_path())?);
//! let client = Arc::new(HttpClientAdapter::new(&config.upstream)?);
//! let router = build_router(Arc::new(ProxyHandler::new(&config, registry, client)));
//! # let _ = router;
//! # Ok(()) }
//! ```
//!
//! # Architecture
//! Request classification, CORS decisions, the registry and listing parsing
//! live in `core` and never do I/O. The upstream is reached through the
//! [`ports::http_client::HttpClient`] trait, implemented by
//! [`adapters::HttpClientAdapter`] and replaced by a mock in tests.
//!
//! # Error Handling
//! Domain errors are `thiserror` enums; bootstrap code returns
//! `eyre::Result<T>` with `WrapErr` context.
pub mod config;
pub mod ports;
pub mod tracing_setup;
pub mod utils;

pub mod adapters;
pub mod core;

pub use crate::{
    adapters::{HttpClientAdapter, ProxyHandler},
    core::FestivalRegistry,
    ports::http_client::HttpClient,
    utils::GracefulShutdown,
};
