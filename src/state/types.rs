//! State types for tracking incremental reads
//!
//! Serialized in the Singer layout:
//! `{"bookmarks": {"<stream>": {"replication_key": ..., "replication_key_value": ...}}}`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Complete tap state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    /// Per-stream bookmarks
    #[serde(default)]
    pub bookmarks: BTreeMap<String, Bookmark>,
}

impl State {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the bookmark for a stream
    pub fn get_bookmark(&self, stream: &str) -> Option<&Bookmark> {
        self.bookmarks.get(stream)
    }

    /// Overwrite the bookmark for a stream
    pub fn set_bookmark(
        &mut self,
        stream: &str,
        replication_key: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.bookmarks.insert(
            stream.to_string(),
            Bookmark::new(replication_key, value),
        );
    }

    /// Move a stream's bookmark forward; older values are ignored
    ///
    /// Returns true when the bookmark changed.
    pub fn advance_bookmark(&mut self, stream: &str, replication_key: &str, value: &str) -> bool {
        let newer = match self.bookmarks.get(stream) {
            Some(existing) => {
                compare_replication_values(value, &existing.replication_key_value)
                    == Ordering::Greater
            }
            None => true,
        };

        if newer {
            self.set_bookmark(stream, replication_key, value);
        }
        newer
    }
}

/// Bookmark for a single stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    /// Field the bookmark tracks (e.g., `modified_date`)
    pub replication_key: String,

    /// Highest value seen for the replication key
    pub replication_key_value: String,
}

impl Bookmark {
    /// Create a new bookmark
    pub fn new(replication_key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            replication_key: replication_key.into(),
            replication_key_value: value.into(),
        }
    }

    /// Bookmark value as a timestamp, when it is one
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.replication_key_value)
    }
}

/// Parse an RFC 3339 timestamp into UTC
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Order two replication values, as timestamps when both parse
pub fn compare_replication_values(a: &str, b: &str) -> Ordering {
    match (parse_timestamp(a), parse_timestamp(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        _ => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_state_default() {
        let state = State::new();
        assert!(state.bookmarks.is_empty());
        assert!(state.get_bookmark("people").is_none());
    }

    #[test]
    fn test_set_bookmark() {
        let mut state = State::new();
        state.set_bookmark("people", "modified_date", "2024-01-01T00:00:00Z");

        assert_eq!(
            state.get_bookmark("people"),
            Some(&Bookmark::new("modified_date", "2024-01-01T00:00:00Z"))
        );
    }

    #[test]
    fn test_advance_bookmark_only_moves_forward() {
        let mut state = State::new();
        assert!(state.advance_bookmark("people", "modified_date", "2024-03-01T00:00:00Z"));
        assert!(!state.advance_bookmark("people", "modified_date", "2024-02-01T00:00:00Z"));
        assert!(state.advance_bookmark("people", "modified_date", "2024-03-02T00:00:00Z"));

        assert_eq!(
            state.get_bookmark("people").map(|b| b.replication_key_value.as_str()),
            Some("2024-03-02T00:00:00Z")
        );
    }

    #[test]
    fn test_compare_replication_values_uses_timestamps() {
        assert_eq!(
            compare_replication_values("2024-01-01T12:00:00+02:00", "2024-01-01T11:00:00Z"),
            Ordering::Less
        );
        assert_eq!(compare_replication_values("b", "a"), Ordering::Greater);
    }

    #[test]
    fn test_bookmark_as_datetime() {
        let bookmark = Bookmark::new("modified_date", "2024-05-06T07:08:09Z");
        let dt = bookmark.as_datetime().unwrap();
        assert_eq!(dt.format("%Y-%m-%dT%H:%M:%SZ").to_string(), "2024-05-06T07:08:09Z");

        assert!(Bookmark::new("id", "42").as_datetime().is_none());
    }

    #[test]
    fn test_state_singer_layout() {
        let mut state = State::new();
        state.set_bookmark("tags", "modified_date", "2024-01-01T00:00:00Z");

        assert_eq!(
            serde_json::to_value(&state).unwrap(),
            json!({
                "bookmarks": {
                    "tags": {
                        "replication_key": "modified_date",
                        "replication_key_value": "2024-01-01T00:00:00Z"
                    }
                }
            })
        );

        let restored: State = serde_json::from_value(json!({})).unwrap();
        assert!(restored.bookmarks.is_empty());
    }
}
