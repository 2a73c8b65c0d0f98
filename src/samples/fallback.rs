//! Sample file lookup

use crate::decode::EmbeddedDecoder;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Where fallback records came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleSource {
    /// The exact `<stream>.json` file
    Exact(PathBuf),
    /// Files whose names contain the stream name
    Matched(Vec<PathBuf>),
    /// No usable file
    None,
}

/// A non-fatal problem met while loading samples
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackIssue {
    /// `<stream>.json` does not exist; the substring scan ran instead
    ExactFileMissing {
        /// Expected file
        path: PathBuf,
    },
    /// A candidate file is not valid JSON
    Malformed {
        /// Offending file
        path: PathBuf,
        /// Parser message
        message: String,
    },
    /// A candidate file or the sample directory could not be read
    Unreadable {
        /// File or directory
        path: PathBuf,
        /// I/O error text
        message: String,
    },
    /// Neither lookup produced a record
    NoSampleData {
        /// Stream without samples
        stream: String,
    },
}

impl FallbackIssue {
    /// True for issues that mean data was lost or never found
    pub fn is_error(&self) -> bool {
        !matches!(self, FallbackIssue::ExactFileMissing { .. })
    }
}

impl std::fmt::Display for FallbackIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FallbackIssue::ExactFileMissing { path } => {
                write!(f, "Sample file '{}' not found", path.display())
            }
            FallbackIssue::Malformed { path, message } => {
                write!(f, "Error decoding JSON from '{}': {message}", path.display())
            }
            FallbackIssue::Unreadable { path, message } => {
                write!(f, "Cannot read '{}': {message}", path.display())
            }
            FallbackIssue::NoSampleData { stream } => {
                write!(f, "No sample data found for stream '{stream}'")
            }
        }
    }
}

/// Result of a fallback lookup
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackOutcome {
    /// Records extracted from the sample file(s)
    pub records: Vec<Value>,
    /// Which file(s) supplied them
    pub source: SampleSource,
    /// Problems met along the way
    pub issues: Vec<FallbackIssue>,
}

impl FallbackOutcome {
    fn new() -> Self {
        Self {
            records: Vec::new(),
            source: SampleSource::None,
            issues: Vec::new(),
        }
    }
}

/// Loads bundled example payloads from a directory
#[derive(Debug, Clone)]
pub struct SampleFileFallback {
    dir: PathBuf,
    decoder: EmbeddedDecoder,
}

impl SampleFileFallback {
    /// Create a fallback reading from `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            decoder: EmbeddedDecoder::new(),
        }
    }

    /// Use a custom decoder for the sample payloads
    #[must_use]
    pub fn with_decoder(mut self, decoder: EmbeddedDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    /// The sample directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load fallback records for a stream
    pub fn load(&self, stream: &str) -> FallbackOutcome {
        let mut outcome = FallbackOutcome::new();
        let exact = self.dir.join(format!("{stream}.json"));

        if exact.is_file() {
            if let Some(records) = self.read_records(&exact, stream, &mut outcome.issues) {
                outcome.records = records;
                outcome.source = SampleSource::Exact(exact);
            }
        } else {
            outcome
                .issues
                .push(FallbackIssue::ExactFileMissing { path: exact });
            self.scan(stream, &mut outcome);
        }

        if outcome.records.is_empty() {
            outcome.issues.push(FallbackIssue::NoSampleData {
                stream: stream.to_string(),
            });
        }

        outcome
    }

    /// Union the records of every `*.json` file whose name contains `stream`
    fn scan(&self, stream: &str, outcome: &mut FallbackOutcome) {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                outcome.issues.push(FallbackIssue::Unreadable {
                    path: self.dir.clone(),
                    message: e.to_string(),
                });
                return;
            }
        };

        let mut candidates: Vec<PathBuf> = entries
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.ends_with(".json") && name.contains(stream))
            })
            .collect();
        candidates.sort();

        let mut matched = Vec::new();
        for path in candidates {
            if let Some(records) = self.read_records(&path, stream, &mut outcome.issues) {
                if !records.is_empty() {
                    outcome.records.extend(records);
                    matched.push(path);
                }
            }
        }

        if !matched.is_empty() {
            outcome.source = SampleSource::Matched(matched);
        }
    }

    /// Read one sample file; `None` when it could not be used
    fn read_records(
        &self,
        path: &Path,
        stream: &str,
        issues: &mut Vec<FallbackIssue>,
    ) -> Option<Vec<Value>> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                issues.push(FallbackIssue::Unreadable {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                });
                return None;
            }
        };

        let value = match self.decoder.parse(&content) {
            Ok(value) => value,
            Err(e) => {
                issues.push(FallbackIssue::Malformed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                });
                return None;
            }
        };

        match self.decoder.extract(&value, stream) {
            Ok(records) => Some(records),
            Err(e) => {
                issues.push(FallbackIssue::Malformed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                });
                None
            }
        }
    }
}
