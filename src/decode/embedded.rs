//! Embedded collection decoder

use crate::error::{Error, Result};
use serde_json::Value;

/// JSONPath of the embedded block in an OSDI response
pub const DEFAULT_RECORDS_PATH: &str = "$._embedded";

/// Decoder for HAL `_embedded` collections
#[derive(Debug, Clone)]
pub struct EmbeddedDecoder {
    /// JSONPath locating the embedded block(s)
    records_path: String,
}

impl Default for EmbeddedDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl EmbeddedDecoder {
    /// Create a decoder for `$._embedded`
    pub fn new() -> Self {
        Self {
            records_path: DEFAULT_RECORDS_PATH.to_string(),
        }
    }

    /// Create a decoder with a custom records path
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            records_path: path.into(),
        }
    }

    /// The configured records path
    pub fn records_path(&self) -> &str {
        &self.records_path
    }

    /// Parse a response body
    pub fn parse(&self, body: &str) -> Result<Value> {
        serde_json::from_str(body).map_err(|e| Error::Decode {
            message: format!("Failed to parse JSON: {e}"),
        })
    }

    /// Extract the records belonging to `stream` from a parsed body
    ///
    /// Only collections whose key contains the stream name contribute, so
    /// unrelated collections embedded in the same page are ignored. Array
    /// collections contribute their items; a lone object counts as one
    /// record.
    pub fn extract(&self, body: &Value, stream: &str) -> Result<Vec<Value>> {
        let mut records = Vec::new();

        for block in self.find_blocks(body)? {
            let Value::Object(collections) = block else {
                continue;
            };

            for (key, collection) in collections {
                if !key.contains(stream) {
                    continue;
                }
                match collection {
                    Value::Array(items) => records.extend(items),
                    Value::Object(_) => records.push(collection),
                    _ => {}
                }
            }
        }

        Ok(records)
    }

    /// Parse a body and extract the records belonging to `stream`
    pub fn decode(&self, body: &str, stream: &str) -> Result<Vec<Value>> {
        let value = self.parse(body)?;
        self.extract(&value, stream)
    }

    fn find_blocks(&self, body: &Value) -> Result<Vec<Value>> {
        use jsonpath_rust::JsonPath;

        let jp = JsonPath::try_from(self.records_path.as_str())
            .map_err(|e| Error::json_path(format!("Invalid JSONPath: {e}")))?;

        match jp.find(body) {
            Value::Array(arr) => Ok(arr),
            Value::Null => Ok(vec![]),
            other => Ok(vec![other]),
        }
    }
}
