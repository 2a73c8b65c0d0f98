//! `read`: walks each selected stream's pages and renders Singer messages
//!
//! Incremental streams send `filter=<key> gt <since>` on their first request
//! and finish with a STATE message carrying the advanced bookmark.

mod types;

pub use types::{Message, SyncConfig, SyncStats};

use crate::catalog::StreamDefinition;
use crate::decode::EmbeddedDecoder;
use crate::error::{Error, Result};
use crate::http::{HttpClient, RequestConfig};
use crate::pagination::{HalPaginator, NextPage, PaginationState};
use crate::schema::flatten;
use crate::state::{compare_replication_values, parse_timestamp, StateManager};
use serde_json::Value;
use std::cmp::Ordering;
use std::time::Instant;
use tracing::{debug, info};

/// Format of the incremental filter's lower bound
const FILTER_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Reads catalog streams into Singer messages
#[derive(Debug)]
pub struct SyncEngine {
    client: HttpClient,
    state: StateManager,
    config: SyncConfig,
    stats: SyncStats,
    paginator: HalPaginator,
    decoder: EmbeddedDecoder,
}

impl SyncEngine {
    /// Create a new sync engine
    pub fn new(client: HttpClient, state: StateManager) -> Self {
        Self {
            client,
            state,
            config: SyncConfig::default(),
            stats: SyncStats::default(),
            paginator: HalPaginator::new(),
            decoder: EmbeddedDecoder::new(),
        }
    }

    /// Set sync configuration
    #[must_use]
    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a different record decoder
    #[must_use]
    pub fn with_decoder(mut self, decoder: EmbeddedDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    /// Get the state manager
    pub fn state(&self) -> &StateManager {
        &self.state
    }

    /// Get statistics
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    /// Read several streams in order, handing each message to `emit` as
    /// soon as it is produced
    ///
    /// Messages of streams read before a failure have already been emitted.
    pub async fn sync_streams<F>(
        &mut self,
        streams: &[&StreamDefinition],
        mut emit: F,
    ) -> Result<()>
    where
        F: FnMut(Message),
    {
        let start = Instant::now();
        let result = self.emit_all(streams, &mut emit).await;
        self.stats.elapsed += start.elapsed();

        if result.is_ok() {
            info!(
                records = self.stats.records_synced,
                streams = self.stats.streams_synced,
                pages = self.stats.pages_fetched,
                elapsed = ?self.stats.elapsed,
                "Read complete"
            );
        }
        result
    }

    async fn emit_all<F>(&mut self, streams: &[&StreamDefinition], emit: &mut F) -> Result<()>
    where
        F: FnMut(Message),
    {
        for stream in streams {
            self.emit_stream(stream, emit).await?;
        }
        Ok(())
    }

    /// Read one stream and collect its messages
    pub async fn sync_stream(&mut self, stream: &StreamDefinition) -> Result<Vec<Message>> {
        let mut messages = Vec::new();
        self.emit_stream(stream, &mut |msg| messages.push(msg)).await?;
        Ok(messages)
    }

    /// Read one stream, handing messages to `emit` page by page
    ///
    /// Emits the stream's SCHEMA, one RECORD per record and, for incremental
    /// streams, a STATE carrying the advanced bookmark. Exceeding the page
    /// budget is an error.
    pub async fn emit_stream<F>(&mut self, stream: &StreamDefinition, emit: &mut F) -> Result<()>
    where
        F: FnMut(Message),
    {
        let replication_key = stream
            .replication_key
            .as_deref()
            .filter(|_| stream.is_incremental());

        emit(Message::schema(
            &stream.name,
            stream.schema.to_json(),
            replication_key,
        ));

        let mut request = RequestConfig::new();
        if let Some(key) = replication_key {
            if let Some(filter) = self.incremental_filter(&stream.name, key).await {
                debug!(stream = %stream.name, %filter, "Applying incremental filter");
                request = request.query("filter", filter);
            }
        }

        let flat = stream.emits_flat_records();
        let mut max_value: Option<String> = None;
        let mut state = PaginationState::new();
        let mut url = stream.url.clone();
        let mut emitted = 0usize;

        'pages: loop {
            self.config.page_budget.check(&state, &url)?;

            let body: Value = self
                .client
                .get_json_with_config(&url, request.clone())
                .await?;
            let records = self.decoder.extract(&body, &stream.collection)?;
            let next = self
                .paginator
                .process_response(&body, records.len(), &mut state);

            debug!(
                stream = %stream.name,
                page = state.pages,
                records = records.len(),
                "Fetched page"
            );

            for record in records {
                if let Some(key) = replication_key {
                    track_max(&mut max_value, &record, key);
                }

                let record = if flat {
                    Value::Object(flatten(&record))
                } else {
                    record
                };
                emit(Message::record(&stream.name, record));
                emitted += 1;

                if self.config.max_records > 0 && emitted >= self.config.max_records {
                    debug!(stream = %stream.name, "Reached max_records");
                    break 'pages;
                }
            }

            match next {
                // The next href carries every query parameter it needs
                NextPage::Continue { url: next_url, .. } => {
                    url = next_url;
                    request = RequestConfig::new();
                }
                NextPage::Done => break,
            }
        }

        self.stats
            .record_stream(usize::try_from(state.pages).unwrap_or(usize::MAX), emitted);

        if let (Some(key), Some(value)) = (replication_key, max_value) {
            if self.state.advance_bookmark(&stream.name, key, &value).await {
                debug!(stream = %stream.name, %value, "Bookmark advanced");
            }
            let snapshot = self.state.snapshot().await;
            let value = serde_json::to_value(&snapshot)
                .map_err(|e| Error::state(format!("Failed to serialize state: {e}")))?;
            emit(Message::state(value));
        }

        info!(
            stream = %stream.name,
            records = emitted,
            pages = state.pages,
            "Stream read complete"
        );

        Ok(())
    }

    /// `filter` query value for an incremental stream
    ///
    /// The bookmark wins over the configured start date. `None` when neither
    /// parses as a timestamp.
    async fn incremental_filter(&self, stream: &str, key: &str) -> Option<String> {
        let bookmark = self
            .state
            .get_bookmark(stream)
            .await
            .and_then(|b| b.as_datetime());

        let since = bookmark.or_else(|| {
            self.config
                .start_date
                .as_deref()
                .and_then(parse_timestamp)
        })?;

        Some(format!("{key} gt {}", since.format(FILTER_DATE_FORMAT)))
    }
}

/// Keep the greatest replication value seen so far
fn track_max(max: &mut Option<String>, record: &Value, key: &str) {
    let Some(value) = record.get(key).and_then(Value::as_str) else {
        return;
    };

    let greater = match max.as_deref() {
        Some(current) => compare_replication_values(value, current) == Ordering::Greater,
        None => true,
    };
    if greater {
        *max = Some(value.to_string());
    }
}

#[cfg(test)]
mod tests;
