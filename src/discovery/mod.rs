//! Stream discovery
//!
//! Finds the collections an OSDI API exposes and infers a schema for each.
//!
//! # Overview
//!
//! 1. Fetch the API root once and resolve its CURIE-prefixed links.
//! 2. Walk each collection's `next` chain within the [`crate::pagination::PageBudget`],
//!    collecting embedded records. A URL already walked under another name is
//!    not fetched again; that stream gets an empty schema.
//! 3. Streams without live records fall back to bundled sample files.
//! 4. Flatten the samples and emit one [`crate::catalog::StreamDefinition`]
//!    per stream.
//!
//! Requests are made one at a time.

mod engine;
mod types;

pub use engine::StreamDiscoveryEngine;
pub use types::{DiscoveryConfig, DiscoveryReport, SampleStore, StreamReport};
