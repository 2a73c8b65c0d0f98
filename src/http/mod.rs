//! Outbound HTTP
//!
//! [`HttpClient`] issues GET requests against the API root and its
//! collections. Requests are paced by a [`RateLimiter`], carry the OSDI token
//! and are retried on 429, 5xx, timeouts and connection errors according to a
//! [`RetryPolicy`].

mod client;
mod rate_limit;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig, RetryPolicy};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
