//! CLI module
//!
//! Command-line interface for running the tap.
//!
//! # Commands
//!
//! - `check` - Test connection to the API root
//! - `discover` - Print a catalog of discovered streams
//! - `read` - Emit SCHEMA, RECORD and STATE messages

mod commands;
mod runner;

pub use commands::{parse_stream_list, Cli, Commands, OutputFormat};
pub use runner::Runner;
