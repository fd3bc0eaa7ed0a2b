// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Solidafy Confluence
//!
//! A resilient pagination and retry layer for the Confluence REST API,
//! cloud and server alike.
//!
//! ## Features
//!
//! - **Rate-limit handling**: `Retry-After` aware backoff with a bounded
//!   attempt count and a wall-clock budget per call
//! - **Self-healing pagination**: page size halving on server errors,
//!   expansion substitution for the `body.storage.value` bug, and correction
//!   of cursors that skip records
//! - **Nested expansions**: every page of every expanded list, merged in place
//! - **Typed users**: one normalized record shape for both deployments
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use futures::TryStreamExt;
//! use solidafy_confluence::{build_confluence_client, load_config, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = load_config("confluence.yaml")?;
//!     let client = build_confluence_client(&config).await?;
//!
//!     let mut pages = client.paginated_cql_retrieval("type=page", Some("version"), None);
//!     while let Some(page) = pages.try_next().await? {
//!         println!("{}", page["title"]);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     ConfluenceClient                         │
//! │  cql  users  groups  members  space permissions  current user│
//! └──────────────────────────────────────────────────────────────┘
//!                │                         │
//! ┌──────────────┴──────────┐   ┌──────────┴───────────┐
//! │ pagination (fetcher)    │──▶│ expansion (resolver) │
//! └──────────────┬──────────┘   └──────────────────────┘
//!                │
//! ┌──────────────┴──────────────────────────────────────────────┐
//! │ http::ApiClient ─ RetryPolicy ─ backoff ─ Transport (reqwest)│
//! └─────────────────────────────────────────────────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Credentials for cloud and server deployments
pub mod auth;

/// HTTP transport, retry and rate limiting
pub mod http;

/// Cursor pagination
pub mod pagination;

/// Nested-expansion resolver
pub mod expansion;

/// Typed record mappers
pub mod records;

/// Confluence retrieval client
pub mod confluence;

/// Connector configuration and validation
pub mod config;

/// Sub-answer ingestion
pub mod ingest;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::{build_confluence_client, load_config, validate_connector_configuration, ConnectorConfig};
pub use confluence::ConfluenceClient;
pub use records::ConfluenceUser;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
