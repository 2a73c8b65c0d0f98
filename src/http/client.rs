//! HTTP client with retry and rate limiting
//!
//! Every request goes through the same pipeline: wait for the rate limiter,
//! send with the default headers and credentials, then classify the outcome
//! as success, retry after a delay, or failure.

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use crate::auth::AuthConfig;
use crate::error::{Error, Result};
use crate::types::BackoffType;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Seconds to wait on a 429 without a usable `Retry-After`
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

// ============================================================================
// Retry policy
// ============================================================================

/// How often and how patiently failed requests are retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_backoff: Duration,
    /// Upper bound for any delay
    pub max_backoff: Duration,
    /// Growth of the delay between retries
    pub backoff_type: BackoffType,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(60),
            backoff_type: BackoffType::Exponential,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt + 1`, capped at `max_backoff`
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = match self.backoff_type {
            BackoffType::Constant => 1,
            BackoffType::Linear => attempt.saturating_add(1),
            BackoffType::Exponential => 2u32.saturating_pow(attempt),
        };

        self.initial_backoff
            .checked_mul(factor)
            .map_or(self.max_backoff, |delay| delay.min(self.max_backoff))
    }
}

// ============================================================================
// Client configuration
// ============================================================================

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Prefix for relative request paths
    pub base_url: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
    /// Retry behaviour
    pub retry: RetryPolicy,
    /// Client-side request rate (`None` = unlimited)
    pub rate_limit: Option<RateLimiterConfig>,
    /// Headers sent with every request
    pub default_headers: HashMap<String, String>,
    /// User-Agent header
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            rate_limit: Some(RateLimiterConfig::default()),
            default_headers: HashMap::from([(
                "Content-Type".to_string(),
                "application/json".to_string(),
            )]),
            user_agent: format!("{}/{}", crate::NAME, crate::VERSION),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for [`HttpClientConfig`]
#[derive(Debug, Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the base URL
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set max retries
    #[must_use]
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.retry.max_retries = retries;
        self
    }

    /// Set the backoff curve
    #[must_use]
    pub fn backoff(mut self, backoff_type: BackoffType, initial: Duration, max: Duration) -> Self {
        self.config.retry.backoff_type = backoff_type;
        self.config.retry.initial_backoff = initial;
        self.config.retry.max_backoff = max;
        self
    }

    /// Set rate limiter
    #[must_use]
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Disable rate limiting
    #[must_use]
    pub fn no_rate_limit(mut self) -> Self {
        self.config.rate_limit = None;
        self
    }

    /// Add a default header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// Per-request additions
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Query parameters, appended in order
    pub query: Vec<(String, String)>,
    /// Extra headers
    pub headers: HashMap<String, String>,
    /// Override for the client's retry count
    pub max_retries: Option<u32>,
}

impl RequestConfig {
    /// Create an empty request config
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Override the retry count
    #[must_use]
    pub fn retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }
}

// ============================================================================
// Client
// ============================================================================

/// What to do after one attempt
enum Outcome {
    Success(Response),
    Retry { delay: Duration, reason: String },
    Failure(Error),
}

/// GET-only HTTP client with retry and rate limiting
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    auth: AuthConfig,
    rate_limiter: Option<RateLimiter>,
}

impl HttpClient {
    /// Create a client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create an unauthenticated client
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        Self::with_auth(config, AuthConfig::None)
    }

    /// Create a client that sends the given credentials
    pub fn with_auth(config: HttpClientConfig, auth_config: AuthConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            client,
            rate_limiter: config.rate_limit.as_ref().map(RateLimiter::new),
            auth: auth_config,
            config,
        })
    }

    /// GET a URL or path
    pub async fn get(&self, url: &str) -> Result<Response> {
        self.get_with_config(url, RequestConfig::default()).await
    }

    /// GET with query parameters or headers
    pub async fn get_with_config(&self, url: &str, config: RequestConfig) -> Result<Response> {
        let full_url = self.build_url(url);
        let max_retries = config.max_retries.unwrap_or(self.config.retry.max_retries);
        let mut attempt = 0;

        loop {
            if let Some(limiter) = &self.rate_limiter {
                limiter.wait().await;
            }

            match self.attempt(&full_url, &config, attempt, max_retries).await {
                Outcome::Success(response) => {
                    debug!("GET {full_url} succeeded");
                    return Ok(response);
                }
                Outcome::Retry { delay, reason } => {
                    warn!(
                        "{reason}, attempt {}/{}, retrying in {delay:?}",
                        attempt + 1,
                        max_retries + 1
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Outcome::Failure(err) => return Err(err),
            }
        }
    }

    /// GET and parse the JSON body
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.get_json_with_config(url, RequestConfig::default())
            .await
    }

    /// GET with a request config and parse the JSON body
    pub async fn get_json_with_config<T: DeserializeOwned>(
        &self,
        url: &str,
        config: RequestConfig,
    ) -> Result<T> {
        let response = self.get_with_config(url, config).await?;
        Ok(response.json().await?)
    }

    /// Send once and classify the result
    async fn attempt(
        &self,
        url: &str,
        config: &RequestConfig,
        attempt: u32,
        max_retries: u32,
    ) -> Outcome {
        let can_retry = attempt < max_retries;

        let mut req = self.client.get(url);
        for (key, value) in self.config.default_headers.iter().chain(&config.headers) {
            req = req.header(key.as_str(), value.as_str());
        }
        if !config.query.is_empty() {
            req = req.query(&config.query);
        }
        req = self.auth.apply(req);

        let response = match req.send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                if can_retry {
                    return Outcome::Retry {
                        delay: self.calculate_backoff(attempt),
                        reason: "Request timeout".to_string(),
                    };
                }
                return Outcome::Failure(Error::Timeout {
                    timeout_ms: u64::try_from(self.config.timeout.as_millis())
                        .unwrap_or(u64::MAX),
                });
            }
            Err(e) if e.is_connect() && can_retry => {
                return Outcome::Retry {
                    delay: self.calculate_backoff(attempt),
                    reason: format!("Connection error ({e})"),
                };
            }
            Err(e) => return Outcome::Failure(Error::Http(e)),
        };

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = retry_after_secs(&response);
            if can_retry {
                return Outcome::Retry {
                    delay: Duration::from_secs(retry_after),
                    reason: "Rate limited (429)".to_string(),
                };
            }
            return Outcome::Failure(Error::RateLimited {
                retry_after_seconds: retry_after,
            });
        }

        if status.is_server_error() && can_retry {
            return Outcome::Retry {
                delay: self.calculate_backoff(attempt),
                reason: format!("Request failed with {}", status.as_u16()),
            };
        }

        if status.is_client_error() || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            return Outcome::Failure(Error::http_status(status.as_u16(), body));
        }

        Outcome::Success(response)
    }

    /// Whether requests are paced
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }

    /// The client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Absolute URLs pass through; paths are joined to the base URL
    fn build_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            return url.to_string();
        }

        match &self.config.base_url {
            Some(base) => format!(
                "{}/{}",
                base.trim_end_matches('/'),
                url.trim_start_matches('/')
            ),
            None => url.to_string(),
        }
    }

    /// Backoff delay for a given attempt
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        self.config.retry.delay(attempt)
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("auth", &self.auth)
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

fn retry_after_secs(response: &Response) -> u64 {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}
