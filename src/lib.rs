//! # OSDI Tap
//!
//! A Singer-style tap for OSDI hypermedia APIs such as Action Network.
//! Streams are not hard-coded: they are discovered from the `_links` of the
//! API root, sampled, and given an inferred flat schema.
//!
//! ## Features
//!
//! - **Link Discovery**: Every curie-prefixed relation on the root is a stream
//! - **Schema Inference**: Sampled records are flattened into dotted paths
//! - **HAL Pagination**: `_links.next` is followed under a page budget
//! - **Sample Fallback**: Bundled pages stand in for empty collections
//! - **Incremental Reads**: `filter=<key> gt <date>` driven by bookmarks
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use osdi_tap::{StreamDiscoveryEngine, HttpClient, TapConfig, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = TapConfig::from_file("tap.yaml")?;
//!     let client = HttpClient::with_auth(config.to_http_config(), config.to_auth_config())?;
//!
//!     let report = StreamDiscoveryEngine::new(client, &config.api_url)
//!         .with_config(config.discovery_config())
//!         .discover()
//!         .await?;
//!
//!     println!("{}", report.into_catalog().to_singer_json());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          CLI Runner                             │
//! │      check → root    discover → Catalog    read → Messages      │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │  Links   │   HTTP    │   Paginate    │  Samples  │   Schema    │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ Curies   │ Retry     │ _links.next   │ Exact     │ Flatten     │
//! │ Dedup    │ Rate Limit│ Page Budget   │ Substring │ Infer       │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::doc_markdown
)]

pub mod error;
pub mod types;

/// OSDI API token header
pub mod auth;

/// HTTP client with retry and rate limiting
pub mod http;

/// HAL pagination and page budgets
pub mod pagination;

/// `_embedded` record extraction
pub mod decode;

/// Link relation parsing and stream resolution
pub mod links;

/// Flattening and schema inference
pub mod schema;

/// Bundled sample page fallback
pub mod samples;

/// Stream definitions and Singer catalogs
pub mod catalog;

/// Stream discovery
pub mod discovery;

/// Bookmarks for incremental reads
pub mod state;

/// Read engine and Singer messages
pub mod engine;

/// Tap configuration
pub mod config;

/// Command-line interface
pub mod cli;

pub use error::{Error, Result};
pub use types::*;

pub use catalog::{Catalog, StreamDefinition};
pub use config::TapConfig;
pub use discovery::{DiscoveryConfig, DiscoveryReport, StreamDiscoveryEngine};
pub use engine::{Message, SyncConfig, SyncEngine};
pub use http::{HttpClient, HttpClientConfig};
pub use schema::{infer_schema, StreamSchema};
pub use state::StateManager;

/// Package version, sent in the User-Agent
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
