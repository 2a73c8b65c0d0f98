//! Schema inference from flattened samples

use super::flatten::{flatten_with, FlattenedRecord, DEFAULT_SEPARATOR};
use super::types::{SchemaProperty, StreamSchema};
use serde_json::Value;

/// Schema inferrer with configuration options
#[derive(Debug, Clone)]
pub struct SchemaInferrer {
    /// Separator used when flattening samples
    separator: String,
}

impl Default for SchemaInferrer {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaInferrer {
    /// Create a new schema inferrer with default settings
    pub fn new() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }

    /// Set the path separator
    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Flatten every sample and merge them with mapping-update semantics
    ///
    /// Keys keep their first-seen position; values are those of the last
    /// sample that carried the key.
    pub fn merge(&self, samples: &[Value]) -> FlattenedRecord {
        let mut merged = FlattenedRecord::new();
        for sample in samples {
            for (key, value) in flatten_with(sample, "", &self.separator) {
                merged.insert(key, value);
            }
        }
        merged
    }

    /// Infer a stream schema from samples
    ///
    /// No samples means no fields. Callers treat that as a degraded schema,
    /// not an error.
    pub fn infer(&self, samples: &[Value]) -> StreamSchema {
        let mut schema = StreamSchema::new();
        for key in self.merge(samples).keys() {
            schema.add_field(key, SchemaProperty::string());
        }
        schema
    }
}

/// Infer a schema with the default inferrer (convenience function)
pub fn infer_schema(samples: &[Value]) -> StreamSchema {
    SchemaInferrer::new().infer(samples)
}

/// Merge flattened samples with the default inferrer (convenience function)
pub fn merge_samples(samples: &[Value]) -> FlattenedRecord {
    SchemaInferrer::new().merge(samples)
}
