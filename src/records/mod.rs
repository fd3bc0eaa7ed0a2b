//! Typed record mappers
//!
//! Turns raw Confluence JSON into the normalized shapes callers consume,
//! and builds the deployment-specific paths and bodies for group and
//! permission endpoints.

pub mod group;
mod user;

pub use user::ConfluenceUser;
