//! Nested-expansion resolver
//!
//! Expanded fields of a content record (`children.page`, `ancestors`, ...)
//! come back as their own paginated envelopes: a `results` list plus a
//! `_links.next` link to the rest. [`resolve`] walks a record depth-first and
//! pulls every remaining page of every such envelope into its `results`.

use crate::error::Result;
use crate::http::ApiClient;
use crate::pagination::{paginate, Cursor};
use crate::types::{ApiOperation, JsonObject};
use futures::TryStreamExt;
use serde_json::Value;
use tracing::debug;

/// Tagged view of a JSON value for traversal
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    /// Object
    Mapping(&'a JsonObject),
    /// Array
    Sequence(&'a [Value]),
    /// Anything else
    Scalar(&'a Value),
}

impl<'a> Node<'a> {
    /// Classify a value
    pub fn of(value: &'a Value) -> Self {
        match value {
            Value::Object(map) => Self::Mapping(map),
            Value::Array(items) => Self::Sequence(items),
            other => Self::Scalar(other),
        }
    }

    /// Continuation link of a paginated envelope.
    ///
    /// Only mappings that hold a `results` list and a non-empty
    /// `_links.next` qualify.
    pub fn continuation(&self) -> Option<Cursor> {
        let Self::Mapping(map) = self else {
            return None;
        };
        if !map.get("results").is_some_and(Value::is_array) {
            return None;
        }
        map.get("_links")
            .and_then(|links| links.get("next"))
            .and_then(Value::as_str)
            .filter(|next| !next.is_empty())
            .map(Cursor::from)
    }

    /// JSON pointers of the direct children, in iteration order
    fn child_pointers(&self, pointer: &str) -> Vec<String> {
        match self {
            Self::Mapping(map) => map
                .keys()
                .map(|key| format!("{pointer}/{}", escape_token(key)))
                .collect(),
            Self::Sequence(items) => (0..items.len())
                .map(|index| format!("{pointer}/{index}"))
                .collect(),
            Self::Scalar(_) => Vec::new(),
        }
    }
}

/// Escape a key for use as a JSON pointer token (RFC 6901)
fn escape_token(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

/// Fetch every continuation page reachable from `record` and merge it in.
///
/// Each envelope's `_links.next` is removed once merged, so resolving an
/// already resolved record makes no requests. Nested pages use the default
/// page size.
pub async fn resolve(api: &ApiClient, mut record: Value) -> Result<Value> {
    let mut stack = vec![String::new()];
    let mut merged = 0usize;

    while let Some(pointer) = stack.pop() {
        let next = match record.pointer(&pointer) {
            Some(value) => Node::of(value).continuation(),
            None => continue,
        };

        if let Some(next) = next {
            debug!(pointer = %pointer, url = %next, "Resolving nested expansion");
            let rest: Vec<Value> = paginate(
                api.clone(),
                ApiOperation::NestedExpansion,
                next,
                None,
                false,
            )
            .try_collect()
            .await?;
            merged += rest.len();

            if let Some(Value::Object(envelope)) = record.pointer_mut(&pointer) {
                merge_envelope(envelope, rest);
            }
        }

        if let Some(value) = record.pointer(&pointer) {
            let mut children = Node::of(value).child_pointers(&pointer);
            children.reverse();
            stack.extend(children);
        }
    }

    if merged > 0 {
        debug!(records = merged, "Merged nested expansion pages");
    }
    Ok(record)
}

fn merge_envelope(envelope: &mut JsonObject, rest: Vec<Value>) {
    if let Some(Value::Array(results)) = envelope.get_mut("results") {
        results.extend(rest);
    }
    if let Some(Value::Object(links)) = envelope.get_mut("_links") {
        links.remove("next");
    }
}
