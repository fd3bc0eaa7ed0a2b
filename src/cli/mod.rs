//! CLI module
//!
//! Command-line interface for querying a Confluence wiki.
//!
//! # Commands
//!
//! - `check` - Validate the connector configuration
//! - `cql` - Search content
//! - `users`, `groups`, `groups-by-user`, `members` - Directory listings
//! - `space-permissions` - Space permission sets (server)
//! - `whoami` - The authenticated user

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
