//! Stream catalog
//!
//! Stream definitions produced by discovery (plus the static `contacts`
//! stream) and their Singer catalog representation.

mod contacts;
mod types;

pub use contacts::{contacts_schema, contacts_stream, CONTACTS_STREAM};
pub use types::{Catalog, StreamDefinition};
