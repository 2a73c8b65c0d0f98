//! Response decoder module
//!
//! Extracts records from the embedded collections of OSDI responses.
//!
//! # Overview
//!
//! Live API pages and bundled sample files share one shape:
//!
//! ```json
//! { "_links": { ... }, "_embedded": { "osdi:people": [ { ... }, { ... } ] } }
//! ```
//!
//! The [`EmbeddedDecoder`] locates the embedded block with a JSONPath and
//! returns the items of every collection whose key mentions the stream.

mod embedded;

pub use embedded::{EmbeddedDecoder, DEFAULT_RECORDS_PATH};
