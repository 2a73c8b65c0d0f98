//! Discovery types
//!
//! Configuration, the per-run sample store and the report handed to the
//! read layer.

use crate::catalog::{Catalog, StreamDefinition};
use crate::pagination::PageBudget;
use crate::samples::{FallbackIssue, SampleSource};
use serde_json::Value;
use std::path::PathBuf;

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for a discovery run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoveryConfig {
    /// Bounds for each stream's page walk
    pub page_budget: PageBudget,
    /// Directory with bundled sample pages
    pub sample_dir: Option<PathBuf>,
    /// Stop sampling a stream after this many records
    pub max_samples: Option<usize>,
    /// Mark streams incremental when their schema has this field
    pub replication_key: Option<String>,
}

impl DiscoveryConfig {
    /// Create a config with the default budget and no fallback
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page budget
    #[must_use]
    pub fn with_page_budget(mut self, budget: PageBudget) -> Self {
        self.page_budget = budget;
        self
    }

    /// Enable the sample file fallback
    #[must_use]
    pub fn with_sample_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.sample_dir = Some(dir.into());
        self
    }

    /// Cap the number of records sampled per stream
    #[must_use]
    pub fn with_max_samples(mut self, max: usize) -> Self {
        self.max_samples = Some(max);
        self
    }

    /// Field that makes a discovered stream incremental
    #[must_use]
    pub fn with_replication_key(mut self, key: impl Into<String>) -> Self {
        self.replication_key = Some(key.into());
        self
    }
}

// ============================================================================
// Sample Store
// ============================================================================

/// Sampled records per stream, in discovery order
#[derive(Debug, Clone, Default)]
pub struct SampleStore {
    buckets: Vec<(String, Vec<Value>)>,
}

impl SampleStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Bucket for a stream, created empty on first use
    pub fn bucket_mut(&mut self, stream: &str) -> &mut Vec<Value> {
        let index = match self.buckets.iter().position(|(name, _)| name == stream) {
            Some(index) => index,
            None => {
                self.buckets.push((stream.to_string(), Vec::new()));
                self.buckets.len() - 1
            }
        };
        &mut self.buckets[index].1
    }

    /// Records sampled for a stream
    pub fn get(&self, stream: &str) -> &[Value] {
        self.buckets
            .iter()
            .find(|(name, _)| name == stream)
            .map_or(&[], |(_, records)| records.as_slice())
    }

    /// Stream names in insertion order
    pub fn streams(&self) -> Vec<&str> {
        self.buckets.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Total records across all buckets
    pub fn total_records(&self) -> usize {
        self.buckets.iter().map(|(_, records)| records.len()).sum()
    }
}

// ============================================================================
// Report
// ============================================================================

/// How one stream was sampled
#[derive(Debug, Clone, PartialEq)]
pub struct StreamReport {
    /// Stream name
    pub name: String,
    /// Collection URL
    pub url: String,
    /// Pages fetched from the API
    pub pages_fetched: u32,
    /// Records collected from live pages
    pub live_records: usize,
    /// Where fallback records came from, when the fallback ran
    pub fallback: Option<SampleSource>,
    /// Stream whose URL this one repeated
    pub duplicate_of: Option<String>,
    /// True when the page walk stopped on the budget
    pub budget_exhausted: bool,
    /// Sample file problems
    pub issues: Vec<FallbackIssue>,
}

impl StreamReport {
    /// Create an empty report for a stream
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            pages_fetched: 0,
            live_records: 0,
            fallback: None,
            duplicate_of: None,
            budget_exhausted: false,
            issues: Vec::new(),
        }
    }

    /// True when this stream was skipped as a URL duplicate
    pub fn is_duplicate(&self) -> bool {
        self.duplicate_of.is_some()
    }
}

/// Outcome of a discovery run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoveryReport {
    /// One definition per discovered stream, in link order
    pub streams: Vec<StreamDefinition>,
    /// Sampling details, parallel to `streams`
    pub reports: Vec<StreamReport>,
}

impl DiscoveryReport {
    /// Look up a discovered stream
    pub fn stream(&self, name: &str) -> Option<&StreamDefinition> {
        self.streams.iter().find(|s| s.name == name)
    }

    /// Look up a stream's sampling details
    pub fn report(&self, name: &str) -> Option<&StreamReport> {
        self.reports.iter().find(|r| r.name == name)
    }

    /// All sample file problems, tagged with their stream
    pub fn issues(&self) -> impl Iterator<Item = (&str, &FallbackIssue)> {
        self.reports
            .iter()
            .flat_map(|r| r.issues.iter().map(move |issue| (r.name.as_str(), issue)))
    }

    /// Catalog of the discovered streams
    pub fn into_catalog(self) -> Catalog {
        let mut catalog = Catalog::new();
        for stream in self.streams {
            catalog.add(stream);
        }
        catalog
    }
}
