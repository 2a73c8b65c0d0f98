//! Tap configuration
//!
//! `TapConfig` is read from a JSON or YAML file (picked by extension) or
//! from inline JSON, and turned into the settings the HTTP client,
//! discovery and the read engine need.

use crate::auth::{AuthConfig, DEFAULT_API_KEY_HEADER};
use crate::discovery::DiscoveryConfig;
use crate::engine::SyncConfig;
use crate::error::{Error, Result};
use crate::http::{HttpClientConfig, RateLimiterConfig};
use crate::pagination::PageBudget;
use crate::state::parse_timestamp;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default OSDI API root
pub const DEFAULT_API_URL: &str = "https://actionnetwork.org/api/v2/";

// ============================================================================
// Top-Level Tap Config
// ============================================================================

/// Complete tap configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TapConfig {
    /// API key sent with every request
    #[serde(default)]
    pub token: String,

    /// API root URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Header carrying the API key
    #[serde(default = "default_auth_header")]
    pub auth_header: String,

    /// Optional User-Agent override
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Directory with bundled sample pages
    #[serde(default)]
    pub sample_dir: Option<PathBuf>,

    /// Earliest replication value for incremental reads (RFC 3339)
    #[serde(default)]
    pub start_date: Option<String>,

    /// Field used for incremental bookmarks
    #[serde(default = "default_replication_key")]
    pub replication_key: String,

    /// Maximum pages per stream walk (0 = unbounded)
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Maximum seconds per stream walk
    #[serde(default)]
    pub max_elapsed_secs: Option<u64>,

    /// Stop sampling a stream after this many records
    #[serde(default)]
    pub max_samples: Option<usize>,

    /// HTTP client configuration
    #[serde(default)]
    pub http: HttpConfig,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_auth_header() -> String {
    DEFAULT_API_KEY_HEADER.to_string()
}

fn default_replication_key() -> String {
    "modified_date".to_string()
}

fn default_max_pages() -> u32 {
    1000
}

// ============================================================================
// HTTP Config
// ============================================================================

/// HTTP client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum number of retries
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Client-side request rate (0 disables the limiter)
    #[serde(default = "default_rps")]
    pub requests_per_second: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
            requests_per_second: default_rps(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_rps() -> u32 {
    4
}

// ============================================================================
// Loading
// ============================================================================

impl TapConfig {
    /// Config with only a token set
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_url: default_api_url(),
            auth_header: default_auth_header(),
            user_agent: None,
            sample_dir: None,
            start_date: None,
            replication_key: default_replication_key(),
            max_pages: default_max_pages(),
            max_elapsed_secs: None,
            max_samples: None,
            http: HttpConfig::default(),
        }
    }

    /// Load and validate a config file
    ///
    /// `.yaml`/`.yml` files are parsed as YAML, everything else as JSON.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file '{}': {e}", path.display()))
        })?;

        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

        if is_yaml {
            Self::from_yaml_str(&contents)
        } else {
            Self::from_json_str(&contents)
        }
    }

    /// Parse and validate inline JSON
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate YAML
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check required fields and value formats
    pub fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(Error::missing_field("token"));
        }

        url::Url::parse(&self.api_url)
            .map_err(|e| Error::invalid_value("api_url", e.to_string()))?;

        if self.auth_header.trim().is_empty() {
            return Err(Error::invalid_value("auth_header", "must not be empty"));
        }

        if let Some(start_date) = &self.start_date {
            if parse_timestamp(start_date).is_none() {
                return Err(Error::invalid_value(
                    "start_date",
                    format!("'{start_date}' is not an RFC 3339 timestamp"),
                ));
            }
        }

        Ok(())
    }

    // ========================================================================
    // Derived settings
    // ========================================================================

    /// Credentials for the HTTP client
    pub fn to_auth_config(&self) -> AuthConfig {
        AuthConfig::api_key_header(&self.auth_header, &self.token)
    }

    /// HTTP client settings
    pub fn to_http_config(&self) -> HttpClientConfig {
        let mut builder = HttpClientConfig::builder()
            .base_url(&self.api_url)
            .timeout(Duration::from_secs(self.http.timeout_secs))
            .max_retries(self.http.max_retries);

        builder = if self.http.requests_per_second == 0 {
            builder.no_rate_limit()
        } else {
            builder.rate_limit(RateLimiterConfig::per_second(
                self.http.requests_per_second,
            ))
        };

        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent);
        }

        builder.build()
    }

    /// Pagination bounds for discovery and reads
    pub fn page_budget(&self) -> PageBudget {
        let mut budget = PageBudget::unbounded();
        if self.max_pages > 0 {
            budget = budget.with_max_pages(self.max_pages);
        }
        if let Some(secs) = self.max_elapsed_secs {
            budget = budget.with_max_elapsed(Duration::from_secs(secs));
        }
        budget
    }

    /// Settings for stream discovery
    pub fn discovery_config(&self) -> DiscoveryConfig {
        let mut config = DiscoveryConfig::new()
            .with_page_budget(self.page_budget())
            .with_replication_key(&self.replication_key);
        if let Some(dir) = &self.sample_dir {
            config = config.with_sample_dir(dir);
        }
        if let Some(max) = self.max_samples {
            config = config.with_max_samples(max);
        }
        config
    }

    /// Settings for the read engine
    pub fn sync_config(&self) -> SyncConfig {
        let config = SyncConfig::new().with_page_budget(self.page_budget());
        match &self.start_date {
            Some(start) => config.with_start_date(start),
            None => config,
        }
    }
}
