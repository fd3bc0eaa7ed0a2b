//! Pagination module
//!
//! Cursor pagination over Confluence `_links.next` links.
//!
//! # Overview
//!
//! A fetch loop starts at a URL, appends a page size, and follows cursors
//! until none is left. Page size shrinks on server errors, the known bad
//! expansion is swapped out, and cursors that would skip records are
//! corrected or, for endpoints without usable cursors, synthesized.

mod cursor;
mod fetcher;
mod strategies;
mod types;

pub use cursor::Cursor;
pub use fetcher::paginate;
pub use strategies::{correct_under_advance, next_page, synthesize_next};
pub use types::{
    NextPage, Page, PaginationState, DEFAULT_PAGINATION_LIMIT, MINIMUM_PAGINATION_LIMIT,
    PROBLEMATIC_EXPANSIONS, REPLACEMENT_EXPANSIONS,
};
