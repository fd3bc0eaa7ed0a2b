//! Continuation cursors
//!
//! Confluence cursors are relative URLs (`_links.next`) whose query string
//! carries the `start` offset. Rewrites touch only the named parameter and
//! keep every other parameter byte-for-byte, so server-encoded values such as
//! CQL expressions survive untouched.

use std::fmt;

/// Opaque continuation reference: a relative URL with a query string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cursor(String);

impl Cursor {
    /// Wrap a URL path
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// The URL as sent to the transport
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// An empty cursor means there is no next page
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Raw (still encoded) value of a query parameter
    pub fn param(&self, name: &str) -> Option<&str> {
        let (_, query) = self.0.split_once('?')?;
        query.split('&').find_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (key == name).then_some(value)
        })
    }

    /// Check whether the query string carries a parameter
    pub fn has_param(&self, name: &str) -> bool {
        self.param(name).is_some()
    }

    /// The `start` offset, `0` when absent or unparsable
    pub fn start(&self) -> usize {
        self.param("start")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }

    /// Copy of this cursor with `name` set to `value`, replacing any existing
    /// occurrence or appending it
    #[must_use]
    pub fn with_param(&self, name: &str, value: &str) -> Self {
        let Some((path, query)) = self.0.split_once('?') else {
            return Self(format!("{}?{name}={value}", self.0));
        };

        let mut replaced = false;
        let mut pairs: Vec<String> = Vec::new();
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let key = pair.split_once('=').map_or(pair, |(k, _)| k);
            if key == name {
                if !replaced {
                    pairs.push(format!("{name}={value}"));
                    replaced = true;
                }
            } else {
                pairs.push(pair.to_string());
            }
        }
        if !replaced {
            pairs.push(format!("{name}={value}"));
        }

        Self(format!("{path}?{}", pairs.join("&")))
    }

    /// Copy with a new `start` offset
    #[must_use]
    pub fn with_start(&self, start: usize) -> Self {
        self.with_param("start", &start.to_string())
    }

    /// Copy with a new page size
    #[must_use]
    pub fn with_limit(&self, limit: u32) -> Self {
        self.with_param("limit", &limit.to_string())
    }

    /// Substring check against the raw URL
    pub fn contains(&self, fragment: &str) -> bool {
        self.0.contains(fragment)
    }

    /// Copy with every occurrence of `from` replaced by `to`
    #[must_use]
    pub fn replace(&self, from: &str, to: &str) -> Self {
        Self(self.0.replace(from, to))
    }

    /// Unwrap into the URL string
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Cursor {
    fn from(url: String) -> Self {
        Self(url)
    }
}

impl From<&str> for Cursor {
    fn from(url: &str) -> Self {
        Self(url.to_string())
    }
}
