//! Authentication module
//!
//! Supports: Basic (cloud: email + API token) and Bearer (server: personal
//! access token).
//!
//! The `Authenticator` attaches credentials to every outgoing request.

mod authenticator;
mod types;

pub use authenticator::Authenticator;
pub use types::AuthConfig;
