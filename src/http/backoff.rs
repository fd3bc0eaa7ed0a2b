//! Backoff classification for throttled responses
//!
//! Confluence signals throttling inconsistently: sometimes a 429, sometimes a
//! different status with "Rate limit exceeded" in the body, with or without a
//! `Retry-After` header. `classify` turns a failed response into either
//! "propagate" or a concrete resume time.

use crate::error::{is_rate_limit_message, Error};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use std::time::Duration;
use tokio::time::Instant;
use tracing::warn;

/// Delay bounds for throttled requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffConfig {
    /// Lower bound applied to server-directed delays
    pub min_delay: Duration,
    /// Upper bound for every delay
    pub max_delay: Duration,
    /// First delay of the exponential schedule
    pub starting_delay: Duration,
    /// Multiplier per attempt
    pub factor: u32,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(60),
            starting_delay: Duration::from_secs(5),
            factor: 2,
        }
    }
}

/// The parts of a failed HTTP call the classifier looks at
#[derive(Debug, Clone, Copy)]
pub struct HttpFailure<'a> {
    /// Status code
    pub status: u16,
    /// Response headers; `None` when the failure carries no response
    pub headers: Option<&'a HeaderMap>,
    /// Response text
    pub body: &'a str,
}

impl<'a> HttpFailure<'a> {
    /// View an `Error::HttpStatus` as a failure; other errors have no response
    pub fn from_error(error: &'a Error) -> Option<Self> {
        match error {
            Error::HttpStatus {
                status,
                headers,
                body,
                ..
            } => Some(Self {
                status: *status,
                headers: headers.as_deref(),
                body,
            }),
            _ => None,
        }
    }

    /// Check whether this failure is a throttling signal
    pub fn is_rate_limited(&self) -> bool {
        self.status == 429 || is_rate_limit_message(self.body)
    }
}

/// Classifier decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Not a throttling failure; hand it back to the caller unchanged
    Propagate,
    /// Throttled; retry once `resume_at` has passed
    Retry {
        /// How long to wait
        delay: Duration,
        /// Monotonic instant after which the call may be retried
        resume_at: Instant,
    },
}

/// Decide what to do about a failed call on the given 0-based attempt.
///
/// `origin` is the instant the call started; see [`resume_time`].
pub fn classify(
    failure: &HttpFailure<'_>,
    attempt: u32,
    origin: Instant,
    config: &BackoffConfig,
) -> Backoff {
    match delay_for(failure, attempt, config) {
        Some(delay) => Backoff::Retry {
            delay,
            resume_at: resume_time(origin, delay),
        },
        None => Backoff::Propagate,
    }
}

/// `now + delay`, rounded up to the next whole second counted from `origin`
pub fn resume_time(origin: Instant, delay: Duration) -> Instant {
    let elapsed = (Instant::now() + delay).saturating_duration_since(origin);
    let mut secs = elapsed.as_secs();
    if elapsed.subsec_nanos() > 0 {
        secs += 1;
    }
    origin + Duration::from_secs(secs)
}

/// Compute the delay for a throttled failure, or `None` if it must propagate
pub fn delay_for(failure: &HttpFailure<'_>, attempt: u32, config: &BackoffConfig) -> Option<Duration> {
    let Some(headers) = failure.headers else {
        warn!(
            status = failure.status,
            "HTTP failure without response headers, not retrying"
        );
        return None;
    };

    if !failure.is_rate_limited() {
        return None;
    }

    match retry_after(headers) {
        Some(seconds) => {
            let max = config.max_delay.as_secs();
            let min = config.min_delay.as_secs();
            let clamped = if seconds > max as i64 {
                warn!("Clamping retry_after from {} to {} seconds", seconds, max);
                max
            } else if seconds < min as i64 {
                min
            } else {
                seconds as u64
            };
            warn!(
                "Rate limiting with retry header. Retrying after {} seconds",
                clamped
            );
            Some(Duration::from_secs(clamped))
        }
        None => {
            let delay = exponential_delay(attempt, config);
            warn!(
                attempt,
                delay_secs = delay.as_secs(),
                "Rate limiting without retry header. Retrying with exponential backoff"
            );
            Some(delay)
        }
    }
}

/// `min(starting_delay * factor^attempt, max_delay)`
pub(crate) fn exponential_delay(attempt: u32, config: &BackoffConfig) -> Duration {
    config
        .starting_delay
        .checked_mul(config.factor.saturating_pow(attempt))
        .map_or(config.max_delay, |d| d.min(config.max_delay))
}

/// Integer `Retry-After` seconds; HTTP-date and garbage values are ignored
fn retry_after(headers: &HeaderMap) -> Option<i64> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<i64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use test_case::test_case;

    fn headers_with_retry_after(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test_case("0", 2 ; "zero raised to minimum")]
    #[test_case("1", 2 ; "below minimum")]
    #[test_case("-7", 2 ; "negative raised to minimum")]
    #[test_case("2", 2 ; "at minimum")]
    #[test_case("17", 17 ; "in range verbatim")]
    #[test_case("60", 60 ; "at maximum")]
    #[test_case("61", 60 ; "above maximum")]
    #[test_case("3600", 60 ; "far above maximum")]
    fn retry_after_is_clamped(header: &str, expected_secs: u64) {
        let headers = headers_with_retry_after(header);
        let failure = HttpFailure {
            status: 429,
            headers: Some(&headers),
            body: "",
        };
        let delay = delay_for(&failure, 3, &BackoffConfig::default());
        assert_eq!(delay, Some(Duration::from_secs(expected_secs)));
    }

    #[test_case(0, 5)]
    #[test_case(1, 10)]
    #[test_case(2, 20)]
    #[test_case(3, 40)]
    #[test_case(4, 60)]
    #[test_case(10, 60)]
    #[test_case(40, 60 ; "overflowing exponent")]
    fn exponential_without_retry_after(attempt: u32, expected_secs: u64) {
        let headers = HeaderMap::new();
        let failure = HttpFailure {
            status: 429,
            headers: Some(&headers),
            body: "",
        };
        let delay = delay_for(&failure, attempt, &BackoffConfig::default());
        assert_eq!(delay, Some(Duration::from_secs(expected_secs)));
    }

    #[test]
    fn unparsable_retry_after_falls_back_to_exponential() {
        let headers = headers_with_retry_after("Wed, 21 Oct 2015 07:28:00 GMT");
        let failure = HttpFailure {
            status: 429,
            headers: Some(&headers),
            body: "",
        };
        let delay = delay_for(&failure, 1, &BackoffConfig::default());
        assert_eq!(delay, Some(Duration::from_secs(10)));
    }

    #[test]
    fn rate_limit_phrase_without_429_is_retried() {
        let headers = HeaderMap::new();
        let failure = HttpFailure {
            status: 403,
            headers: Some(&headers),
            body: "{\"message\":\"Rate Limit Exceeded\"}",
        };
        assert!(delay_for(&failure, 0, &BackoffConfig::default()).is_some());
    }

    #[test]
    fn other_failures_propagate() {
        let headers = headers_with_retry_after("5");
        let failure = HttpFailure {
            status: 500,
            headers: Some(&headers),
            body: "Internal Server Error",
        };
        assert_eq!(
            classify(&failure, 0, Instant::now(), &BackoffConfig::default()),
            Backoff::Propagate
        );
    }

    #[test]
    fn missing_headers_propagate() {
        let failure = HttpFailure {
            status: 429,
            headers: None,
            body: "rate limit exceeded",
        };
        assert_eq!(
            classify(&failure, 0, Instant::now(), &BackoffConfig::default()),
            Backoff::Propagate
        );
    }

    #[tokio::test(start_paused = true)]
    async fn resume_time_rounds_up_to_whole_seconds() {
        let origin = Instant::now();
        tokio::time::advance(Duration::from_millis(1300)).await;

        assert_eq!(
            resume_time(origin, Duration::from_secs(3)),
            origin + Duration::from_secs(5)
        );

        tokio::time::advance(Duration::from_millis(700)).await;
        assert_eq!(
            resume_time(origin, Duration::from_secs(3)),
            origin + Duration::from_secs(5)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn resume_at_is_now_plus_delay() {
        let headers = headers_with_retry_after("30");
        let failure = HttpFailure {
            status: 429,
            headers: Some(&headers),
            body: "",
        };
        let before = Instant::now();
        match classify(&failure, 0, Instant::now(), &BackoffConfig::default()) {
            Backoff::Retry { delay, resume_at } => {
                assert_eq!(delay, Duration::from_secs(30));
                assert_eq!(resume_at, before + Duration::from_secs(30));
            }
            Backoff::Propagate => panic!("expected retry"),
        }
    }

    #[test]
    fn failure_from_error() {
        let err = Error::http_status(429, "rest/api/group", "");
        let failure = HttpFailure::from_error(&err).unwrap();
        assert_eq!(failure.status, 429);
        assert!(failure.headers.is_none());

        assert!(HttpFailure::from_error(&Error::config("x")).is_none());
    }
}
