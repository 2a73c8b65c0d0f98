//! Catalog types

use crate::error::{Error, Result, ResultExt};
use crate::schema::{JsonType, StreamSchema};
use crate::types::ReplicationMethod;
use serde_json::{json, Map, Value};
use std::path::Path;

// ============================================================================
// Stream Definition
// ============================================================================

/// A readable stream: where it lives and what its records look like
#[derive(Debug, Clone, PartialEq)]
pub struct StreamDefinition {
    /// Stream name (unique within a catalog)
    pub name: String,
    /// First page URL
    pub url: String,
    /// Declared record schema
    pub schema: StreamSchema,
    /// Substring matched against `_embedded` keys (usually the name)
    pub collection: String,
    /// Field used for incremental bookmarks
    pub replication_key: Option<String>,
    /// Full table or incremental
    pub replication_method: ReplicationMethod,
    /// Whether the stream is read by default
    pub selected: bool,
}

impl StreamDefinition {
    /// Create a full-table stream
    pub fn new(name: impl Into<String>, url: impl Into<String>, schema: StreamSchema) -> Self {
        let name = name.into();
        Self {
            collection: name.clone(),
            name,
            url: url.into(),
            schema,
            replication_key: None,
            replication_method: ReplicationMethod::FullTable,
            selected: true,
        }
    }

    /// Read incrementally on the given key
    #[must_use]
    pub fn with_replication_key(mut self, key: impl Into<String>) -> Self {
        self.replication_key = Some(key.into());
        self.replication_method = ReplicationMethod::Incremental;
        self
    }

    /// Match records under a different collection name
    #[must_use]
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Mark the stream selected or not
    #[must_use]
    pub fn with_selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    /// True when incremental with a replication key
    pub fn is_incremental(&self) -> bool {
        self.replication_method == ReplicationMethod::Incremental
            && self.replication_key.is_some()
    }

    /// True when records should be emitted flattened
    ///
    /// Inferred schemas only declare scalar leaves; static schemas with
    /// nested objects or arrays describe raw records.
    pub fn emits_flat_records(&self) -> bool {
        self.schema.fields.iter().all(|field| {
            !matches!(
                field.property.json_type,
                JsonType::Object | JsonType::Array
            )
        })
    }

    /// Render as a Singer catalog entry
    pub fn to_singer_json(&self) -> Value {
        let mut metadata = Map::new();
        metadata.insert("inclusion".to_string(), json!("available"));
        metadata.insert("selected".to_string(), json!(self.selected));
        metadata.insert(
            "forced-replication-method".to_string(),
            json!(self.replication_method),
        );
        if let Some(key) = &self.replication_key {
            metadata.insert("valid-replication-keys".to_string(), json!([key]));
        }
        metadata.insert("url".to_string(), json!(self.url));
        metadata.insert("collection".to_string(), json!(self.collection));

        let mut entry = Map::new();
        entry.insert("tap_stream_id".to_string(), json!(self.name));
        entry.insert("stream".to_string(), json!(self.name));
        entry.insert("schema".to_string(), self.schema.to_json());
        entry.insert(
            "metadata".to_string(),
            json!([{ "breadcrumb": [], "metadata": metadata }]),
        );
        entry.insert(
            "replication_method".to_string(),
            json!(self.replication_method),
        );
        if let Some(key) = &self.replication_key {
            entry.insert("replication_key".to_string(), json!(key));
        }

        Value::Object(entry)
    }

    /// Parse a Singer catalog entry
    pub fn from_singer_json(value: &Value) -> Result<Self> {
        let name = value
            .get("tap_stream_id")
            .or_else(|| value.get("stream"))
            .and_then(Value::as_str)
            .ok_or_else(|| Error::decode("Catalog entry without 'tap_stream_id'"))?;

        let metadata = stream_metadata(value);
        let url = metadata
            .and_then(|m| m.get("url"))
            .and_then(Value::as_str)
            .ok_or_else(|| Error::decode(format!("Catalog entry '{name}' has no url")))?;

        let schema = match value.get("schema") {
            Some(schema) => StreamSchema::from_json(schema)?,
            None => StreamSchema::new(),
        };

        let mut stream = Self::new(name, url, schema);

        if let Some(collection) = metadata
            .and_then(|m| m.get("collection"))
            .and_then(Value::as_str)
        {
            stream = stream.with_collection(collection);
        }

        if let Some(selected) = metadata
            .and_then(|m| m.get("selected"))
            .and_then(Value::as_bool)
        {
            stream = stream.with_selected(selected);
        }

        let method = value
            .get("replication_method")
            .or_else(|| metadata.and_then(|m| m.get("forced-replication-method")))
            .map(|m| serde_json::from_value::<ReplicationMethod>(m.clone()))
            .transpose()?
            .unwrap_or_default();

        if method == ReplicationMethod::Incremental {
            if let Some(key) = value.get("replication_key").and_then(Value::as_str) {
                stream = stream.with_replication_key(key);
            }
        }

        Ok(stream)
    }
}

/// Stream-level (empty breadcrumb) metadata of a catalog entry
fn stream_metadata(value: &Value) -> Option<&Map<String, Value>> {
    value
        .get("metadata")?
        .as_array()?
        .iter()
        .find(|entry| {
            entry
                .get("breadcrumb")
                .and_then(Value::as_array)
                .is_some_and(Vec::is_empty)
        })?
        .get("metadata")?
        .as_object()
}

// ============================================================================
// Catalog
// ============================================================================

/// Ordered set of streams
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    /// Streams in discovery order
    pub streams: Vec<StreamDefinition>,
}

impl Catalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stream, replacing one with the same name in place
    pub fn add(&mut self, stream: StreamDefinition) {
        match self.streams.iter_mut().find(|s| s.name == stream.name) {
            Some(existing) => *existing = stream,
            None => self.streams.push(stream),
        }
    }

    /// Add a stream only when its name is free
    pub fn add_if_absent(&mut self, stream: StreamDefinition) -> bool {
        if self.get(&stream.name).is_some() {
            return false;
        }
        self.streams.push(stream);
        true
    }

    /// Look up a stream by name
    pub fn get(&self, name: &str) -> Option<&StreamDefinition> {
        self.streams.iter().find(|s| s.name == name)
    }

    /// Stream names in order
    pub fn names(&self) -> Vec<&str> {
        self.streams.iter().map(|s| s.name.as_str()).collect()
    }

    /// Number of streams
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    /// True when there are no streams
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Streams to read
    ///
    /// With an explicit list, every name must exist and is returned in
    /// the requested order; otherwise all selected streams are returned.
    pub fn select(&self, names: Option<&[String]>) -> Result<Vec<&StreamDefinition>> {
        match names {
            Some(names) => names
                .iter()
                .map(|name| {
                    self.get(name)
                        .ok_or_else(|| Error::StreamNotFound {
                            stream: name.clone(),
                        })
                })
                .collect(),
            None => Ok(self.streams.iter().filter(|s| s.selected).collect()),
        }
    }

    /// Render as a Singer catalog
    pub fn to_singer_json(&self) -> Value {
        let streams: Vec<Value> = self
            .streams
            .iter()
            .map(StreamDefinition::to_singer_json)
            .collect();
        json!({ "streams": streams })
    }

    /// Parse a Singer catalog
    pub fn from_singer_json(value: &Value) -> Result<Self> {
        let entries = value
            .get("streams")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::decode("Catalog without a 'streams' array"))?;

        let mut catalog = Self::new();
        for entry in entries {
            catalog.add(StreamDefinition::from_singer_json(entry)?);
        }
        Ok(catalog)
    }

    /// Load a Singer catalog file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read catalog '{}': {e}", path.display()))
        })?;
        let value: Value = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid catalog '{}'", path.display()))?;
        Self::from_singer_json(&value)
    }
}

impl IntoIterator for Catalog {
    type Item = StreamDefinition;
    type IntoIter = std::vec::IntoIter<StreamDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.streams.into_iter()
    }
}
