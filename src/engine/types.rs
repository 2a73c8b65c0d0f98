//! Singer messages, read settings and read totals

use crate::pagination::PageBudget;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};
use std::time::Duration;

/// A message emitted during a read
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Schema of the records that follow
    Schema {
        /// Stream name
        stream: String,
        /// JSON Schema document
        schema: Value,
        /// Primary key fields
        key_properties: Vec<String>,
        /// Fields used for bookmarks
        bookmark_properties: Vec<String>,
    },
    /// A single record
    Record {
        /// Stream name
        stream: String,
        /// Record body
        record: Value,
        /// When the record was fetched
        time_extracted: DateTime<Utc>,
    },
    /// Full tap state
    State {
        /// State document
        value: Value,
    },
}

impl Message {
    /// Create a schema message
    pub fn schema(stream: impl Into<String>, schema: Value, bookmark: Option<&str>) -> Self {
        Self::Schema {
            stream: stream.into(),
            schema,
            key_properties: Vec::new(),
            bookmark_properties: bookmark.map(ToString::to_string).into_iter().collect(),
        }
    }

    /// Create a record message stamped now
    pub fn record(stream: impl Into<String>, record: Value) -> Self {
        Self::record_at(stream, record, Utc::now())
    }

    /// Create a record message with an explicit extraction time
    pub fn record_at(
        stream: impl Into<String>,
        record: Value,
        time_extracted: DateTime<Utc>,
    ) -> Self {
        Self::Record {
            stream: stream.into(),
            record,
            time_extracted,
        }
    }

    /// Create a state message
    pub fn state(value: Value) -> Self {
        Self::State { value }
    }

    /// Singer message type
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Schema { .. } => "SCHEMA",
            Self::Record { .. } => "RECORD",
            Self::State { .. } => "STATE",
        }
    }

    /// Stream the message belongs to; STATE spans all streams
    pub fn stream(&self) -> Option<&str> {
        match self {
            Self::Schema { stream, .. } | Self::Record { stream, .. } => Some(stream),
            Self::State { .. } => None,
        }
    }

    /// Render in the Singer wire format
    pub fn to_json(&self) -> Value {
        match self {
            Self::Schema {
                stream,
                schema,
                key_properties,
                bookmark_properties,
            } => json!({
                "type": self.kind(),
                "stream": stream,
                "schema": schema,
                "key_properties": key_properties,
                "bookmark_properties": bookmark_properties,
            }),
            Self::Record {
                stream,
                record,
                time_extracted,
            } => json!({
                "type": self.kind(),
                "stream": stream,
                "record": record,
                "time_extracted": time_extracted.to_rfc3339_opts(SecondsFormat::Secs, true),
            }),
            Self::State { value } => json!({
                "type": self.kind(),
                "value": value,
            }),
        }
    }
}

/// Settings for `read`
#[derive(Debug, Clone, Default)]
pub struct SyncConfig {
    /// Bounds for each stream's page walk
    pub page_budget: PageBudget,
    /// Lower bound for incremental streams without a bookmark
    pub start_date: Option<String>,
    /// Maximum records per stream (0 = unlimited)
    pub max_records: usize,
}

impl SyncConfig {
    /// Unbounded budget, no start date, no record cap
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page budget
    #[must_use]
    pub fn with_page_budget(mut self, budget: PageBudget) -> Self {
        self.page_budget = budget;
        self
    }

    /// Set the incremental start date
    #[must_use]
    pub fn with_start_date(mut self, start_date: impl Into<String>) -> Self {
        self.start_date = Some(start_date.into());
        self
    }

    /// Stop each stream after `max` records
    #[must_use]
    pub fn with_max_records(mut self, max: usize) -> Self {
        self.max_records = max;
        self
    }
}

/// Totals over every stream an engine has read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// RECORD messages emitted
    pub records_synced: usize,
    /// Collection pages requested
    pub pages_fetched: usize,
    /// Streams read to completion
    pub streams_synced: usize,
    /// Wall time spent in `sync_streams`
    pub elapsed: Duration,
}

impl SyncStats {
    /// Fold in one finished stream
    pub fn record_stream(&mut self, pages: usize, records: usize) {
        self.streams_synced += 1;
        self.pages_fetched += pages;
        self.records_synced += records;
    }
}
