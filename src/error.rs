//! Error types for Solidafy Confluence
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use reqwest::header::HeaderMap;
use thiserror::Error;

/// The main error type for Solidafy Confluence
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Connector validation failed: {message}")]
    ConnectorValidation { message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}: {body}")]
    HttpStatus {
        status: u16,
        url: String,
        /// Response headers, absent when the failure was not built from a response
        headers: Option<Box<HeaderMap>>,
        body: String,
    },

    #[error("Rate limited on {operation}, gave up after {attempts} attempts: {last}")]
    RateLimited {
        operation: String,
        attempts: u32,
        /// The throttled response of the final attempt
        #[source]
        last: Box<Error>,
    },

    #[error("{operation} attempts took longer than {timeout_secs} seconds")]
    Timeout {
        operation: String,
        timeout_secs: u64,
    },

    #[error("HTTP client entered an unexpected state: {message}")]
    ClientState { message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Response Errors
    // ============================================================================
    #[error("Malformed response from {url}: {message}")]
    MalformedResponse { url: String, message: String },

    #[error("Permission denied: {message}: {source}")]
    PermissionDenied {
        message: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Unsupported: {message}")]
    Unsupported { message: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create a connector validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ConnectorValidation {
            message: message.into(),
        }
    }

    /// Create an HTTP status error without response headers
    pub fn http_status(status: u16, url: impl Into<String>, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            url: url.into(),
            headers: None,
            body: body.into(),
        }
    }

    /// Create a malformed response error
    pub fn malformed(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a client state error
    pub fn client_state(message: impl Into<String>) -> Self {
        Self::ClientState {
            message: message.into(),
        }
    }

    /// Create an unsupported operation error
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }

    /// Create a permission error wrapping the response that was refused
    pub fn permission_denied(message: impl Into<String>, source: Error) -> Self {
        Self::PermissionDenied {
            message: message.into(),
            source: Box::new(source),
        }
    }

    /// HTTP status carried by this error, if any.
    ///
    /// Errors wrapping a failed response report that response's status.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::HttpStatus { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            Error::RateLimited { last, .. } => last.status(),
            Error::PermissionDenied { source, .. } => source.status(),
            _ => None,
        }
    }

    /// URL of the failed request, if any
    pub fn url(&self) -> Option<&str> {
        match self {
            Error::HttpStatus { url, .. } | Error::MalformedResponse { url, .. } => Some(url),
            Error::RateLimited { last, .. } => last.url(),
            Error::PermissionDenied { source, .. } => source.url(),
            _ => None,
        }
    }
}

/// Lowercased phrase Confluence puts in throttled responses that lack a 429
pub(crate) const RATE_LIMIT_MESSAGE_LOWERCASE: &str = "rate limit exceeded";

/// Check whether a response body reports rate limiting
pub(crate) fn is_rate_limit_message(body: &str) -> bool {
    body.to_lowercase().contains(RATE_LIMIT_MESSAGE_LOWERCASE)
}

/// Result type alias for Solidafy Confluence
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::missing_field("access_token");
        assert_eq!(
            err.to_string(),
            "Missing required config field: access_token"
        );

        let err = Error::http_status(404, "rest/api/group", "Not found");
        assert_eq!(err.to_string(), "HTTP 404 from rest/api/group: Not found");

        let err = Error::Timeout {
            operation: "content_search".to_string(),
            timeout_secs: 600,
        };
        assert_eq!(
            err.to_string(),
            "content_search attempts took longer than 600 seconds"
        );
    }

    #[test]
    fn test_wrapped_response_context() {
        let denied = Error::permission_denied(
            "The calling user does not have permission",
            Error::http_status(403, "rest/api/user/current", "user lacks 'view' on space ENG"),
        );
        assert_eq!(denied.status(), Some(403));
        assert_eq!(denied.url(), Some("rest/api/user/current"));
        assert!(denied.to_string().contains("user lacks 'view' on space ENG"));

        let exhausted = Error::RateLimited {
            operation: "groups".to_string(),
            attempts: 5,
            last: Box::new(Error::http_status(429, "rest/api/group", "slow down")),
        };
        assert_eq!(exhausted.status(), Some(429));
        assert_eq!(exhausted.url(), Some("rest/api/group"));
        assert!(std::error::Error::source(&exhausted).is_some());
    }

    #[test]
    fn test_status_accessor() {
        assert_eq!(Error::http_status(502, "", "").status(), Some(502));
        assert_eq!(Error::config("x").status(), None);
    }

    #[test]
    fn test_rate_limit_message_is_case_insensitive() {
        assert!(is_rate_limit_message("RATE LIMIT EXCEEDED"));
        assert!(is_rate_limit_message("{\"message\": \"Rate limit exceeded\"}"));
        assert!(!is_rate_limit_message("rate limited"));
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::config("inner"));
        let with_context = result.context("outer");
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Configuration error: inner"));
    }
}
