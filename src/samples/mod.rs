//! Sample file fallback
//!
//! Supplies substitute records for a stream when live sampling found none.
//!
//! Sample files are shaped like live API pages, so the same embedded-record
//! extraction applies. Lookup order:
//!
//! 1. `<dir>/<stream>.json`
//! 2. only if that file does not exist: every `*.json` file in `<dir>` whose
//!    name contains the stream name, unioned in filename order
//!
//! Problems are returned as [`FallbackIssue`] values; nothing here logs or
//! fails.

mod fallback;

pub use fallback::{FallbackIssue, FallbackOutcome, SampleFileFallback, SampleSource};

#[cfg(test)]
mod tests;
