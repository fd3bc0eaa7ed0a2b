//! Pagination types
//!
//! Page request state for one fetch loop and the parsed shape of a page.

use super::cursor::Cursor;
use crate::error::{Error, Result};
use serde_json::Value;

/// Page size used when the caller gives none
pub const DEFAULT_PAGINATION_LIMIT: u32 = 1000;

/// Page size below which server errors are no longer retried
pub const MINIMUM_PAGINATION_LIMIT: u32 = 50;

/// Expansion that makes the content search endpoint fail outright
/// (<https://jira.atlassian.com/browse/CONFCLOUD-76433>)
pub const PROBLEMATIC_EXPANSIONS: &str = "body.storage.value";

/// Expansion requested instead of [`PROBLEMATIC_EXPANSIONS`]
pub const REPLACEMENT_EXPANSIONS: &str = "body.view.value";

/// Result of the next page computation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPage {
    /// Fetch this cursor next
    Continue(Cursor),
    /// No more pages
    Done,
}

impl NextPage {
    /// Build from a cursor; an empty cursor means done
    pub fn from_cursor(cursor: Cursor) -> Self {
        if cursor.is_empty() {
            Self::Done
        } else {
            Self::Continue(cursor)
        }
    }

    /// Check if this is a done result
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

/// One parsed page of results
#[derive(Debug, Clone, Default)]
pub struct Page {
    /// Records in server order
    pub results: Vec<Value>,
    /// Server-provided `_links.next`, if non-empty
    pub next: Option<Cursor>,
}

impl Page {
    /// Extract `results` and `_links.next` from a response body.
    ///
    /// A missing `results` field is an empty page; a `results` field that is
    /// not a list is malformed.
    pub fn from_body(body: Value, url: &str) -> Result<Self> {
        let Value::Object(mut map) = body else {
            return Err(Error::malformed(url, "expected a JSON object"));
        };

        let results = match map.remove("results") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(results)) => results,
            Some(other) => {
                return Err(Error::malformed(
                    url,
                    format!("`results` is not a list: {other}"),
                ))
            }
        };

        let next = map
            .get("_links")
            .and_then(|links| links.get("next"))
            .and_then(Value::as_str)
            .filter(|next| !next.is_empty())
            .map(Cursor::from);

        Ok(Self { results, next })
    }
}

/// Mutable state of one fetch loop.
///
/// Owned by a single retrieval and never shared.
#[derive(Debug, Clone)]
pub struct PaginationState {
    /// Cursor for the next request
    pub cursor: Cursor,
    /// Current page size
    pub limit: u32,
    /// Build next cursors from result counts instead of trusting the server
    pub auto_paginate: bool,
    /// Total records fetched so far
    pub total_fetched: u64,
    /// Pages fetched so far
    pub pages: u32,
    /// Is pagination complete?
    pub done: bool,
}

impl PaginationState {
    /// Start a loop at `url` with the given page size (default 1000)
    pub fn new(url: impl Into<Cursor>, limit: Option<u32>, auto_paginate: bool) -> Self {
        let limit = limit
            .filter(|l| *l > 0)
            .unwrap_or(DEFAULT_PAGINATION_LIMIT);
        let cursor: Cursor = url.into();
        Self {
            cursor: cursor.with_limit(limit),
            limit,
            auto_paginate,
            total_fetched: 0,
            pages: 0,
            done: false,
        }
    }

    /// Halve the page size if it is still above the floor.
    ///
    /// Returns the new limit, or `None` when the floor was already reached.
    pub fn reduce_limit(&mut self) -> Option<u32> {
        if self.limit <= MINIMUM_PAGINATION_LIMIT {
            return None;
        }
        self.limit /= 2;
        self.cursor = self.cursor.with_limit(self.limit);
        Some(self.limit)
    }

    /// Swap the problematic expansion for its replacement.
    ///
    /// Returns `false` if the cursor does not request it.
    pub fn substitute_expansion(&mut self) -> bool {
        if !self.cursor.contains(PROBLEMATIC_EXPANSIONS) {
            return false;
        }
        self.cursor = self
            .cursor
            .replace(PROBLEMATIC_EXPANSIONS, REPLACEMENT_EXPANSIONS);
        true
    }

    /// Count a fetched page
    pub fn add_fetched(&mut self, count: usize) {
        self.total_fetched += count as u64;
        self.pages += 1;
    }

    /// Move to the next page or finish
    pub fn advance(&mut self, next: NextPage) {
        match next {
            NextPage::Continue(cursor) => self.cursor = cursor,
            NextPage::Done => self.mark_done(),
        }
    }

    /// Mark pagination as complete
    pub fn mark_done(&mut self) {
        self.done = true;
    }
}
