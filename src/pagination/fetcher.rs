//! Cursor-paginating fetcher
//!
//! Drives GETs against a cursor-bearing endpoint and yields records one by
//! one, recovering from the failures Confluence is known for:
//! - the `body.storage.value` expansion bug (URL rewrite)
//! - 5xx under large pages (halve the limit, down to the floor)
//! - under-advancing or missing cursors (see [`super::strategies`])

use super::cursor::Cursor;
use super::strategies::next_page;
use super::types::{Page, PaginationState, PROBLEMATIC_EXPANSIONS, REPLACEMENT_EXPANSIONS};
use crate::error::{Error, Result};
use crate::http::ApiClient;
use crate::types::{ApiOperation, RecordStream};
use futures::{stream, StreamExt, TryStreamExt};
use serde_json::Value;
use tracing::{debug, error, warn, Instrument, Span};

/// Lazily paginate `url`, yielding each record as its page arrives.
///
/// The stream is finite and not restartable: after an error it ends, and a
/// caller that wants to resume must start over. Page fetches run inside the
/// span that was current when the stream was created.
pub fn paginate(
    api: ApiClient,
    operation: ApiOperation,
    url: impl Into<Cursor>,
    limit: Option<u32>,
    auto_paginate: bool,
) -> RecordStream<Value> {
    let state = PaginationState::new(url, limit, auto_paginate);
    let span = Span::current();

    stream::try_unfold((api, state, span), move |(api, mut state, span)| async move {
        if state.done {
            debug!(
                parent: &span,
                %operation,
                pages = state.pages,
                records = state.total_fetched,
                "Pagination complete"
            );
            return Ok::<_, Error>(None);
        }
        let records = fetch_page(&api, operation, &mut state)
            .instrument(span.clone())
            .await?;
        Ok(Some((records, (api, state, span))))
    })
    .map_ok(|records| stream::iter(records.into_iter().map(Ok)))
    .try_flatten()
    .boxed()
}

/// Run one FETCHING iteration: fetch the current cursor (with recovery),
/// advance the state, and return the page's records.
async fn fetch_page(
    api: &ApiClient,
    operation: ApiOperation,
    state: &mut PaginationState,
) -> Result<Vec<Value>> {
    loop {
        debug!(url = %state.cursor, limit = state.limit, "Making confluence call");

        let response = match api.get(operation, state.cursor.as_str(), &[]).await {
            Ok(response) => response,
            Err(err) => {
                recover(state, err)?;
                continue;
            }
        };

        let body = response.json().inspect_err(|e| {
            error!("Failed to parse response as JSON from {}: {}", state.cursor, e);
        })?;
        let page = Page::from_body(body, state.cursor.as_str())?;

        let returned = page.results.len();
        state.add_fetched(returned);
        let next = next_page(&state.cursor, page.next, returned, state.auto_paginate);
        state.advance(next);

        return Ok(page.results);
    }
}

/// Apply the corrective action for a failed page request, or hand the error
/// back when none applies.
fn recover(state: &mut PaginationState, err: Error) -> Result<()> {
    let Error::HttpStatus {
        status, ref body, ..
    } = err
    else {
        error!("Error in confluence call to {}: {}", state.cursor, err);
        return Err(err);
    };

    warn!("Error in confluence call to {}", state.cursor);

    if state.substitute_expansion() {
        warn!(
            "Replacing {} with {} and trying again.",
            PROBLEMATIC_EXPANSIONS, REPLACEMENT_EXPANSIONS
        );
        return Ok(());
    }

    if status >= 500 {
        let previous = state.limit;
        if let Some(new_limit) = state.reduce_limit() {
            warn!(
                status,
                body = %body,
                "Reducing limit from {} to {} and trying again.",
                previous,
                new_limit
            );
            return Ok(());
        }
    }

    error!(
        status,
        body = %body,
        "Error in confluence call to {}",
        state.cursor
    );
    Err(err)
}
