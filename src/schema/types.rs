//! Schema types
//!
//! A stream schema is a plain ordered list of `(name, property)` pairs.
//! Inferred schemas only ever hold nullable strings; the richer variants
//! exist for hand-written schemas such as the well-known contacts stream.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// JSON Schema type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonType {
    /// `"string"`
    String,
    /// `"number"`
    Number,
    /// `"integer"`
    Integer,
    /// `"boolean"`
    Boolean,
    /// `"object"`
    Object,
    /// `"array"`
    Array,
    /// `"null"`
    Null,
}

impl JsonType {
    /// Parse a JSON Schema type name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(JsonType::String),
            "number" => Some(JsonType::Number),
            "integer" => Some(JsonType::Integer),
            "boolean" => Some(JsonType::Boolean),
            "object" => Some(JsonType::Object),
            "array" => Some(JsonType::Array),
            "null" => Some(JsonType::Null),
            _ => None,
        }
    }
}

impl std::fmt::Display for JsonType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JsonType::String => write!(f, "string"),
            JsonType::Number => write!(f, "number"),
            JsonType::Integer => write!(f, "integer"),
            JsonType::Boolean => write!(f, "boolean"),
            JsonType::Object => write!(f, "object"),
            JsonType::Array => write!(f, "array"),
            JsonType::Null => write!(f, "null"),
        }
    }
}

/// JSON Schema property definition
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaProperty {
    /// Primary type
    pub json_type: JsonType,
    /// Whether `null` is also accepted
    pub nullable: bool,
    /// Nested properties (for objects)
    pub properties: Vec<SchemaField>,
    /// Array items schema
    pub items: Option<Box<SchemaProperty>>,
}

impl SchemaProperty {
    /// Create a nullable property with the given type
    pub fn new(json_type: JsonType) -> Self {
        Self {
            json_type,
            nullable: true,
            properties: Vec::new(),
            items: None,
        }
    }

    /// The generic property every inferred field uses
    pub fn string() -> Self {
        Self::new(JsonType::String)
    }

    /// Create an object property with nested fields
    pub fn object(properties: Vec<SchemaField>) -> Self {
        Self {
            properties,
            ..Self::new(JsonType::Object)
        }
    }

    /// Create an array property with an item schema
    pub fn array(items: SchemaProperty) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::new(JsonType::Array)
        }
    }

    /// Disallow null
    #[must_use]
    pub fn required(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Render as a JSON Schema fragment
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        let json_type = if self.nullable && self.json_type != JsonType::Null {
            json!([self.json_type, JsonType::Null])
        } else {
            json!([self.json_type])
        };
        out.insert("type".to_string(), json_type);

        if self.json_type == JsonType::Object {
            out.insert("properties".to_string(), fields_to_json(&self.properties));
        }
        if let Some(items) = &self.items {
            out.insert("items".to_string(), items.to_json());
        }

        Value::Object(out)
    }

    /// Parse a JSON Schema fragment
    pub fn from_json(value: &Value) -> Result<Self> {
        let types: Vec<JsonType> = match value.get("type") {
            Some(Value::String(name)) => JsonType::from_name(name).into_iter().collect(),
            Some(Value::Array(names)) => names
                .iter()
                .filter_map(Value::as_str)
                .filter_map(JsonType::from_name)
                .collect(),
            _ => Vec::new(),
        };

        let json_type = types
            .iter()
            .copied()
            .find(|t| *t != JsonType::Null)
            .or_else(|| types.first().copied())
            .ok_or_else(|| Error::decode(format!("Schema property without a type: {value}")))?;

        let properties = match value.get("properties") {
            Some(props) => fields_from_json(props)?,
            None => Vec::new(),
        };

        let items = match value.get("items") {
            Some(items) => Some(Box::new(Self::from_json(items)?)),
            None => None,
        };

        Ok(Self {
            json_type,
            nullable: types.contains(&JsonType::Null),
            properties,
            items,
        })
    }
}

/// A named property
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaField {
    /// Field name (a dotted path for inferred schemas)
    pub name: String,
    /// Declared property
    pub property: SchemaProperty,
}

impl SchemaField {
    /// Create a field
    pub fn new(name: impl Into<String>, property: SchemaProperty) -> Self {
        Self {
            name: name.into(),
            property,
        }
    }
}

/// Ordered schema for one stream
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamSchema {
    /// Fields in declaration order
    pub fields: Vec<SchemaField>,
}

impl StreamSchema {
    /// Create an empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a schema from fields
    pub fn from_fields(fields: Vec<SchemaField>) -> Self {
        let mut schema = Self::new();
        for field in fields {
            schema.add_field(field.name, field.property);
        }
        schema
    }

    /// Add a field, replacing an existing one in place
    pub fn add_field(&mut self, name: impl Into<String>, property: SchemaProperty) {
        let name = name.into();
        match self.fields.iter_mut().find(|f| f.name == name) {
            Some(existing) => existing.property = property,
            None => self.fields.push(SchemaField::new(name, property)),
        }
    }

    /// Look up a field's property
    pub fn get(&self, name: &str) -> Option<&SchemaProperty> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| &f.property)
    }

    /// Check whether a field is declared
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Field names in order
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Number of declared fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when nothing was declared
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Render as a JSON Schema document
    pub fn to_json(&self) -> Value {
        json!({
            "type": "object",
            "properties": fields_to_json(&self.fields),
        })
    }

    /// Convert to pretty JSON string
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(&self.to_json()).unwrap_or_default()
    }

    /// Parse a JSON Schema document (only `properties` is read)
    pub fn from_json(value: &Value) -> Result<Self> {
        match value.get("properties") {
            Some(props) => Ok(Self {
                fields: fields_from_json(props)?,
            }),
            None => Ok(Self::new()),
        }
    }
}

fn fields_to_json(fields: &[SchemaField]) -> Value {
    let mut props = Map::new();
    for field in fields {
        props.insert(field.name.clone(), field.property.to_json());
    }
    Value::Object(props)
}

fn fields_from_json(value: &Value) -> Result<Vec<SchemaField>> {
    let Value::Object(props) = value else {
        return Err(Error::decode("Schema 'properties' must be an object"));
    };

    props
        .iter()
        .map(|(name, prop)| Ok(SchemaField::new(name, SchemaProperty::from_json(prop)?)))
        .collect()
}
