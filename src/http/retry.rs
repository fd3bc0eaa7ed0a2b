//! Retry wrapper applied to every API call
//!
//! `RetryPolicy::run` retries a call when:
//! - the server throttled it (delay chosen by [`super::backoff::classify`])
//! - the HTTP client failed mid-request (fixed pause)
//!
//! Everything else propagates on the first failure. Attempts are bounded and
//! the whole call shares one wall-clock budget.

use super::backoff::{classify, Backoff, BackoffConfig, HttpFailure};
use crate::error::{Error, Result};
use crate::types::ApiOperation;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Configuration for the retry policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of attempts per call
    pub max_attempts: u32,
    /// Wall-clock budget measured from the first attempt
    pub timeout: Duration,
    /// Granularity of backoff waits
    pub poll_interval: Duration,
    /// Pause after a client-state failure
    pub client_state_pause: Duration,
    /// Throttling delays
    pub backoff: BackoffConfig,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            timeout: Duration::from_secs(600),
            poll_interval: Duration::from_secs(1),
            client_state_pause: Duration::from_secs(5),
            backoff: BackoffConfig::default(),
        }
    }
}

impl RetryConfig {
    /// Create a new config builder
    pub fn builder() -> RetryConfigBuilder {
        RetryConfigBuilder::default()
    }

    /// Low-retry profile for connection checks: fail fast instead of waiting
    /// out long throttling windows
    pub fn minimal() -> Self {
        Self {
            max_attempts: 6,
            timeout: Duration::from_secs(60),
            backoff: BackoffConfig {
                max_delay: Duration::from_secs(10),
                ..BackoffConfig::default()
            },
            ..Self::default()
        }
    }
}

/// Builder for retry config
#[derive(Default)]
pub struct RetryConfigBuilder {
    config: RetryConfig,
}

impl RetryConfigBuilder {
    /// Set max attempts
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.max_attempts = attempts.max(1);
        self
    }

    /// Set the wall-clock budget
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the wait polling interval
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Set the pause used after client-state failures
    pub fn client_state_pause(mut self, pause: Duration) -> Self {
        self.config.client_state_pause = pause;
        self
    }

    /// Set throttling delays
    pub fn backoff(mut self, backoff: BackoffConfig) -> Self {
        self.config.backoff = backoff;
        self
    }

    /// Build the config
    pub fn build(self) -> RetryConfig {
        self.config
    }
}

/// Per-call retry state: attempt counter, start instant and absolute deadline
#[derive(Debug, Clone)]
pub struct RetryBudget {
    attempt: u32,
    max_attempts: u32,
    started: Instant,
    deadline: Instant,
}

impl RetryBudget {
    /// Start a budget now
    pub fn start(config: &RetryConfig) -> Self {
        let started = Instant::now();
        Self {
            attempt: 0,
            max_attempts: config.max_attempts.max(1),
            started,
            deadline: started + config.timeout,
        }
    }

    /// Current 0-based attempt
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Instant the first attempt started; resume times are whole seconds from here
    pub fn started(&self) -> Instant {
        self.started
    }

    /// Check whether the current attempt is the final one allowed
    pub fn is_last_attempt(&self) -> bool {
        self.attempt + 1 >= self.max_attempts
    }

    /// Check whether the wall-clock budget is spent
    pub fn is_expired(&self) -> bool {
        Instant::now() > self.deadline
    }

    fn advance(&mut self) {
        self.attempt += 1;
    }
}

/// Retry wrapper shared by every operation of a client
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    /// Create a policy with the given config
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Run `call` until it succeeds, fails for a non-retryable reason, runs out
    /// of attempts, or exceeds the wall-clock budget.
    pub async fn run<T, F, Fut>(&self, operation: ApiOperation, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut budget = RetryBudget::start(&self.config);

        loop {
            if budget.is_expired() {
                return Err(Error::Timeout {
                    operation: operation.to_string(),
                    timeout_secs: self.config.timeout.as_secs(),
                });
            }

            let err = match call().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            match err {
                Error::HttpStatus { .. } => {
                    let decision = match HttpFailure::from_error(&err) {
                        Some(failure) => classify(
                            &failure,
                            budget.attempt(),
                            budget.started(),
                            &self.config.backoff,
                        ),
                        None => Backoff::Propagate,
                    };
                    let Backoff::Retry { delay, resume_at } = decision else {
                        return Err(err);
                    };
                    if budget.is_last_attempt() {
                        return Err(Error::RateLimited {
                            operation: operation.to_string(),
                            attempts: budget.attempt() + 1,
                            last: Box::new(err),
                        });
                    }
                    warn!(
                        %operation,
                        attempt = budget.attempt() + 1,
                        delay_secs = delay.as_secs(),
                        "Rate limited, retrying after backoff"
                    );
                    self.wait_until(resume_at).await;
                }
                Error::ClientState { .. } => {
                    if budget.is_last_attempt() {
                        return Err(err);
                    }
                    warn!(
                        %operation,
                        attempt = budget.attempt() + 1,
                        error = %err,
                        "HTTP client failed mid-request, retrying"
                    );
                    tokio::time::sleep(self.config.client_state_pause).await;
                }
                other => return Err(other),
            }

            budget.advance();
        }
    }

    /// Sleep in `poll_interval` steps until `resume_at`
    async fn wait_until(&self, resume_at: Instant) {
        loop {
            let now = Instant::now();
            if now >= resume_at {
                break;
            }
            tokio::time::sleep((resume_at - now).min(self.config.poll_interval)).await;
        }
        debug!("Backoff wait finished");
    }
}
