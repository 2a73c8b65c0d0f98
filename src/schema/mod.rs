//! Schema inference module
//!
//! Turns heterogeneous, arbitrarily nested sample records into a flat,
//! tabular stream schema.
//!
//! # Features
//!
//! - **Flattening**: Nested objects become dotted key paths
//! - **List Expansion**: Arrays of objects are merged under `list_item`
//! - **Schema Union**: Keys from every sample contribute, in first-seen order
//! - **Generic Typing**: Every inferred field is declared as a nullable string

mod flatten;
mod inference;
mod types;

pub use flatten::{
    flatten, flatten_with, FlattenedRecord, DEFAULT_SEPARATOR, LIST_ITEM_SEGMENT, LIST_SEGMENT,
};
pub use inference::{infer_schema, merge_samples, SchemaInferrer};
pub use types::{JsonType, SchemaField, SchemaProperty, StreamSchema};
