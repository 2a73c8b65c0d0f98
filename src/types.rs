//! Common types used throughout the tap
//!
//! Shared type aliases and small enums used across multiple modules.

use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type (insertion ordered)
pub type JsonObject = serde_json::Map<String, JsonValue>;

// ============================================================================
// Backoff
// ============================================================================

/// Backoff strategy used between HTTP retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Same delay every attempt
    Constant,
    /// Delay grows linearly with the attempt number
    Linear,
    /// Delay doubles every attempt
    #[default]
    Exponential,
}

// ============================================================================
// Replication
// ============================================================================

/// How a stream is read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplicationMethod {
    /// Fetch everything every run
    #[default]
    FullTable,
    /// Only fetch records modified after the stored bookmark
    Incremental,
}

impl std::fmt::Display for ReplicationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReplicationMethod::FullTable => write!(f, "FULL_TABLE"),
            ReplicationMethod::Incremental => write!(f, "INCREMENTAL"),
        }
    }
}
