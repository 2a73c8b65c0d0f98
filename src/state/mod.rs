//! State management module
//!
//! Tracks incremental-read bookmarks in the Singer state layout.
//! State is persisted between runs so each read resumes after the
//! highest replication value seen.

mod manager;
mod types;

pub use manager::StateManager;
pub use types::{compare_replication_values, parse_timestamp, Bookmark, State};
