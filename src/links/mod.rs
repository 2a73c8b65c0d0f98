//! Hypermedia link resolution
//!
//! Turns the `_links` block of the API root into the set of streams the tap
//! can read. A relation is a stream candidate only when its key is written
//! as `<prefix>:<name>` and `<prefix>` is declared in `_links.curies`.

mod resolver;

pub use resolver::{
    curie_names, parse_relation, resolve_streams, DiscoveredStream, DiscoveredStreams,
    LinkRelation,
};
