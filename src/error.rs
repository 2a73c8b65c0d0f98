//! Crate-wide error type
//!
//! Sample-file problems are not errors; they are reported as
//! [`crate::samples::FallbackIssue`] values and discovery carries on.

use thiserror::Error;

/// Everything that can stop a `check`, `discover` or `read`
#[derive(Error, Debug)]
pub enum Error {
    // Configuration
    /// Config could not be loaded or is inconsistent
    #[error("Configuration error: {message}")]
    Config {
        /// What is wrong
        message: String,
    },

    /// A required config key is absent or empty
    #[error("Missing required config field: {field}")]
    MissingConfigField {
        /// Config key
        field: String,
    },

    /// A config key holds an unusable value
    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue {
        /// Config key
        field: String,
        /// Why the value was rejected
        message: String,
    },

    /// YAML config did not parse
    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON config, catalog or response did not parse
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // Transport
    /// The request could not be sent or its body not read
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        /// Response status code
        status: u16,
        /// Response body text
        body: String,
    },

    /// 429 with no retries left
    #[error("Rate limited, retry after {retry_after_seconds}s")]
    RateLimited {
        /// Wait requested by the server
        retry_after_seconds: u64,
    },

    /// The request timed out with no retries left
    #[error("Request timeout after {timeout_ms}ms")]
    Timeout {
        /// Configured per-request timeout
        timeout_ms: u64,
    },

    /// A URL did not parse or join
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // Response handling
    /// A records path could not be compiled
    #[error("JSONPath error: {message}")]
    JsonPath {
        /// Compiler message
        message: String,
    },

    /// A document has an unexpected shape
    #[error("Failed to decode response: {message}")]
    Decode {
        /// What was expected
        message: String,
    },

    /// A `next` chain outran the page budget
    #[error("Pagination budget exceeded for '{url}' after {pages} pages")]
    PaginationBudgetExceeded {
        /// Page that would have been fetched next
        url: String,
        /// Pages already fetched
        pages: u32,
    },

    // Catalog and bookmarks
    /// State could not be read, parsed or written
    #[error("State error: {message}")]
    State {
        /// What failed
        message: String,
    },

    /// A requested stream is not in the catalog
    #[error("Stream '{stream}' not found in catalog")]
    StreamNotFound {
        /// Requested name
        stream: String,
    },

    /// Filesystem failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An error prefixed with context by [`ResultExt`]
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// [`Error::Config`]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// [`Error::MissingConfigField`]
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// [`Error::InvalidConfigValue`]
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// [`Error::HttpStatus`]
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// [`Error::JsonPath`]
    pub fn json_path(message: impl Into<String>) -> Self {
        Self::JsonPath {
            message: message.into(),
        }
    }

    /// [`Error::Decode`]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// [`Error::State`]
    pub fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    /// [`Error::PaginationBudgetExceeded`]
    pub fn budget_exceeded(url: impl Into<String>, pages: u32) -> Self {
        Self::PaginationBudgetExceeded {
            url: url.into(),
            pages,
        }
    }

    /// HTTP status of a failed response, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            Self::RateLimited { .. } => Some(429),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Prefix an error with a description of what was being attempted
pub trait ResultExt<T> {
    /// Fixed prefix
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Prefix built only on failure
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.with_context(|| message.into())
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| Error::Other(format!("{}: {}", f(), e.into())))
    }
}
