//! Record flattening
//!
//! Collapses a nested JSON object into a single-level mapping keyed by
//! dotted paths. The output keeps first-seen key order, and a key written
//! twice keeps its original position with the later value.

use crate::types::JsonObject;
use serde_json::Value;

/// Separator placed between path segments
pub const DEFAULT_SEPARATOR: &str = ".";

/// Segment appended to a key holding an array of objects
pub const LIST_ITEM_SEGMENT: &str = "list_item";

/// Segment appended to a key holding an array of scalars
pub const LIST_SEGMENT: &str = "list";

/// A flattened record: dotted path -> leaf value
pub type FlattenedRecord = JsonObject;

/// Flatten a record using the default `.` separator
///
/// Non-object input has no keys and flattens to an empty mapping.
pub fn flatten(record: &Value) -> FlattenedRecord {
    flatten_with(record, "", DEFAULT_SEPARATOR)
}

/// Flatten a record under `parent_key` using a custom separator
///
/// Rules, applied per key in iteration order:
/// - objects recurse under the joined key
/// - arrays whose first element is an object are expanded under
///   `<key><sep>list_item`, every element sharing that key space
/// - other non-empty arrays are kept whole under `<key><sep>list`
/// - empty arrays are dropped
/// - anything else (including null) is a leaf
pub fn flatten_with(record: &Value, parent_key: &str, separator: &str) -> FlattenedRecord {
    let mut out = FlattenedRecord::new();
    if let Value::Object(map) = record {
        flatten_into(map, parent_key, separator, &mut out);
    }
    out
}

fn flatten_into(map: &JsonObject, parent_key: &str, separator: &str, out: &mut FlattenedRecord) {
    for (key, value) in map {
        let new_key = join(parent_key, key, separator);

        match value {
            Value::Object(nested) => flatten_into(nested, &new_key, separator, out),
            Value::Array(items) if items.first().is_some_and(Value::is_object) => {
                let item_key = join(&new_key, LIST_ITEM_SEGMENT, separator);
                for item in items {
                    // Mixed arrays: only the object elements have keys to contribute
                    if let Value::Object(obj) = item {
                        flatten_into(obj, &item_key, separator, out);
                    }
                }
            }
            Value::Array(items) if !items.is_empty() => {
                out.insert(join(&new_key, LIST_SEGMENT, separator), value.clone());
            }
            Value::Array(_) => {}
            _ => {
                out.insert(new_key, value.clone());
            }
        }
    }
}

fn join(parent_key: &str, key: &str, separator: &str) -> String {
    if parent_key.is_empty() {
        key.to_string()
    } else {
        format!("{parent_key}{separator}{key}")
    }
}
