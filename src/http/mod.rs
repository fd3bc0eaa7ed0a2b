//! HTTP module
//!
//! Provides the transport used to reach Confluence and the retry machinery
//! wrapped around every call.
//!
//! # Features
//!
//! - **Transport**: `Transport` trait with a reqwest-backed `HttpTransport`
//! - **Rate Limiting**: Optional client-side token bucket using governor
//! - **Backoff**: Classifies throttled responses into a resume time
//! - **Retries**: Bounded attempts under a wall-clock budget

mod api;
mod backoff;
mod client;
mod rate_limit;
mod retry;

pub use api::ApiClient;
pub use backoff::{classify, delay_for, resume_time, Backoff, BackoffConfig, HttpFailure};
pub use client::{HttpClientConfig, HttpClientConfigBuilder, HttpResponse, HttpTransport, Transport};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
pub use retry::{RetryBudget, RetryConfig, RetryConfigBuilder, RetryPolicy};

#[cfg(test)]
pub(crate) mod mock;
