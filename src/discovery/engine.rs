//! Stream discovery engine

use super::types::{DiscoveryConfig, DiscoveryReport, SampleStore, StreamReport};
use crate::catalog::StreamDefinition;
use crate::decode::EmbeddedDecoder;
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::links::{resolve_streams, DiscoveredStream};
use crate::pagination::{HalPaginator, NextPage, PaginationState};
use crate::samples::{FallbackIssue, SampleFileFallback};
use crate::schema::{SchemaInferrer, StreamSchema};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Discovers streams from the API root and infers their schemas
#[derive(Debug)]
pub struct StreamDiscoveryEngine {
    client: HttpClient,
    root_url: String,
    config: DiscoveryConfig,
    paginator: HalPaginator,
    decoder: EmbeddedDecoder,
    inferrer: SchemaInferrer,
}

impl StreamDiscoveryEngine {
    /// Create an engine for the given API root
    pub fn new(client: HttpClient, root_url: impl Into<String>) -> Self {
        Self {
            client,
            root_url: root_url.into(),
            config: DiscoveryConfig::default(),
            paginator: HalPaginator::new(),
            decoder: EmbeddedDecoder::new(),
            inferrer: SchemaInferrer::new(),
        }
    }

    /// Set discovery configuration
    #[must_use]
    pub fn with_config(mut self, config: DiscoveryConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a different record decoder
    #[must_use]
    pub fn with_decoder(mut self, decoder: EmbeddedDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    /// Run discovery
    ///
    /// Fetches the root once, walks every discovered collection, falls back
    /// to sample files for streams with no live records and infers one
    /// schema per stream. HTTP failures abort the run.
    pub async fn discover(&self) -> Result<DiscoveryReport> {
        let start = Instant::now();

        let root: Value = self.client.get_json(&self.root_url).await?;
        let candidates = resolve_streams(&root);
        info!(
            "Discovered {} stream(s) at {}: {:?}",
            candidates.len(),
            self.root_url,
            candidates.names()
        );

        let mut store = SampleStore::new();
        let mut visited: HashMap<String, String> = HashMap::new();
        let mut report = DiscoveryReport::default();

        for candidate in candidates.iter() {
            let mut stream_report = StreamReport::new(&candidate.name, &candidate.url);
            // Duplicates keep an empty bucket
            let bucket = store.bucket_mut(&candidate.name);

            if let Some(first) = visited.get(&candidate.url) {
                debug!(
                    stream = %candidate.name,
                    url = %candidate.url,
                    "URL already sampled by '{first}', skipping"
                );
                stream_report.duplicate_of = Some(first.clone());
            } else {
                visited.insert(candidate.url.clone(), candidate.name.clone());
                let records = self.sample_stream(candidate, &mut stream_report).await?;
                bucket.extend(records);
            }

            let schema = self.infer(&candidate.name, store.get(&candidate.name));
            report.streams.push(self.definition(candidate, schema));
            report.reports.push(stream_report);
        }

        info!(
            "Discovery finished: {} stream(s), {} sampled record(s) in {:?}",
            report.streams.len(),
            store.total_records(),
            start.elapsed()
        );

        Ok(report)
    }

    /// Collect sample records for one stream
    async fn sample_stream(
        &self,
        stream: &DiscoveredStream,
        report: &mut StreamReport,
    ) -> Result<Vec<Value>> {
        let mut records = self.walk_pages(stream, report).await?;
        report.live_records = records.len();

        if records.is_empty() {
            if let Some(dir) = &self.config.sample_dir {
                let fallback = SampleFileFallback::new(dir).with_decoder(self.decoder.clone());
                let outcome = fallback.load(&stream.name);
                log_issues(&stream.name, &outcome.issues);

                records = outcome.records;
                if let Some(max) = self.config.max_samples {
                    records.truncate(max);
                }
                report.fallback = Some(outcome.source);
                report.issues = outcome.issues;
            }
        }

        debug!(
            stream = %stream.name,
            pages = report.pages_fetched,
            records = records.len(),
            "Sampling complete"
        );

        Ok(records)
    }

    /// Follow `next` links from the collection URL, collecting records
    async fn walk_pages(
        &self,
        stream: &DiscoveredStream,
        report: &mut StreamReport,
    ) -> Result<Vec<Value>> {
        let mut state = PaginationState::new();
        let mut records = Vec::new();
        let mut url = stream.url.clone();

        loop {
            if let Err(e) = self.config.page_budget.check(&state, &url) {
                match e {
                    Error::PaginationBudgetExceeded { .. } => {
                        warn!(stream = %stream.name, "{e}; keeping {} record(s)", records.len());
                        report.budget_exhausted = true;
                        break;
                    }
                    other => return Err(other),
                }
            }

            let body: Value = self.client.get_json(&url).await?;
            let page_records = self.decoder.extract(&body, &stream.name)?;
            let count = page_records.len();
            records.extend(page_records);

            let next = self.paginator.process_response(&body, count, &mut state);
            debug!(
                stream = %stream.name,
                page = state.pages,
                records = count,
                "Fetched page"
            );

            if let Some(max) = self.config.max_samples {
                if records.len() >= max {
                    records.truncate(max);
                    break;
                }
            }

            match next {
                NextPage::Continue { url: next_url, .. } => url = next_url,
                NextPage::Done => break,
            }
        }

        report.pages_fetched = state.pages;
        Ok(records)
    }

    fn infer(&self, stream: &str, records: &[Value]) -> StreamSchema {
        let schema = self.inferrer.infer(records);
        if schema.is_empty() {
            warn!(stream, "No samples; emitting an empty schema");
        }
        schema
    }

    fn definition(&self, stream: &DiscoveredStream, schema: StreamSchema) -> StreamDefinition {
        let incremental = self
            .config
            .replication_key
            .as_deref()
            .filter(|key| schema.contains(key));

        let definition = StreamDefinition::new(&stream.name, &stream.url, schema);
        match incremental {
            Some(key) => definition.with_replication_key(key),
            None => definition,
        }
    }
}

fn log_issues(stream: &str, issues: &[FallbackIssue]) {
    for issue in issues {
        if issue.is_error() {
            warn!(stream, "{issue}");
        } else {
            debug!(stream, "{issue}");
        }
    }
}
