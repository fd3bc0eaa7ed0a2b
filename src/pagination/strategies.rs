//! Next-cursor strategies
//!
//! Confluence cursors cannot always be trusted:
//! - When the requested limit exceeds what the server is configured to
//!   return, it returns fewer results but still advances `start` by the full
//!   limit. Following that cursor silently skips records.
//! - Some endpoints (cloud user search) return no usable cursor at all.

use super::cursor::Cursor;
use super::types::NextPage;
use tracing::warn;

/// Clamp a server cursor so `start` advances by at most `returned` records
pub fn correct_under_advance(previous: &Cursor, next: Cursor, returned: usize) -> Cursor {
    if !next.has_param("start") {
        return next;
    }

    let previous_start = previous.start();
    let new_start = next.start();
    if new_start.saturating_sub(previous_start) <= returned {
        return next;
    }

    warn!(
        "Start was updated by more than the amount of results retrieved. \
         This is a bug with Confluence. Start: {}, Previous Start: {}, Len Results: {}",
        new_start, previous_start, returned
    );
    next.with_start(previous_start + returned)
}

/// Build the next cursor by advancing the previous request's `start`
pub fn synthesize_next(previous: &Cursor, returned: usize) -> Cursor {
    previous.with_start(previous.start() + returned)
}

/// Decide where the loop goes after a page of `returned` records.
///
/// With `auto_paginate` the server cursor is ignored whenever records came
/// back; an empty page ends the loop because no advance is possible.
pub fn next_page(
    previous: &Cursor,
    server_next: Option<Cursor>,
    returned: usize,
    auto_paginate: bool,
) -> NextPage {
    if auto_paginate {
        if returned == 0 {
            return NextPage::Done;
        }
        return NextPage::Continue(synthesize_next(previous, returned));
    }

    match server_next {
        Some(next) if !next.is_empty() => {
            NextPage::from_cursor(correct_under_advance(previous, next, returned))
        }
        _ => NextPage::Done,
    }
}
