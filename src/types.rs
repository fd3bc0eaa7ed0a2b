//! Common types used throughout Solidafy Confluence
//!
//! This module contains shared type definitions, type aliases,
//! and utility types used across multiple modules.

use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// Lazy, finite, non-restartable sequence of records
pub type RecordStream<T> = BoxStream<'static, crate::error::Result<T>>;

// ============================================================================
// Deployment
// ============================================================================

/// Which flavour of Confluence the client talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Deployment {
    /// Atlassian cloud (`*.atlassian.net/wiki`)
    #[default]
    Cloud,
    /// Self-hosted server or data center
    Server,
}

impl Deployment {
    /// Pick the deployment from the connector's `is_cloud` flag
    pub fn from_is_cloud(is_cloud: bool) -> Self {
        if is_cloud {
            Self::Cloud
        } else {
            Self::Server
        }
    }

    /// Check if this is a cloud deployment
    pub fn is_cloud(self) -> bool {
        matches!(self, Self::Cloud)
    }
}

impl fmt::Display for Deployment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cloud => f.write_str("cloud"),
            Self::Server => f.write_str("server"),
        }
    }
}

// ============================================================================
// API Operations
// ============================================================================

/// Every remote call the client makes, named for logs and retry budgets.
///
/// All requests go through [`crate::http::RetryPolicy::run`] tagged with one of
/// these, so the set of retried calls is fixed at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiOperation {
    /// `rest/api/content/search`
    ContentSearch,
    /// Continuation pages of a nested expansion
    NestedExpansion,
    /// `rest/api/search/user` (cloud)
    UserSearch,
    /// `rest/api/user/list` (server)
    UserList,
    /// `rest/api/user/memberof`
    GroupsByUser,
    /// `rest/api/group`
    Groups,
    /// `rest/api/group/{name}/member`
    GroupMembers,
    /// JSON-RPC `getSpacePermissionSets` (server)
    SpacePermissions,
    /// `rest/api/user/current`
    CurrentUser,
    /// `rest/api/space`, used by connector validation
    Spaces,
    /// Caller-supplied endpoint passed to `paginate_url`
    Custom,
}

impl ApiOperation {
    /// Stable snake_case name used in logs and errors
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ContentSearch => "content_search",
            Self::NestedExpansion => "nested_expansion",
            Self::UserSearch => "user_search",
            Self::UserList => "user_list",
            Self::GroupsByUser => "groups_by_user",
            Self::Groups => "groups",
            Self::GroupMembers => "group_members",
            Self::SpacePermissions => "space_permissions",
            Self::CurrentUser => "current_user",
            Self::Spaces => "spaces",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for ApiOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deployment_from_flag() {
        assert_eq!(Deployment::from_is_cloud(true), Deployment::Cloud);
        assert_eq!(Deployment::from_is_cloud(false), Deployment::Server);
        assert!(Deployment::Cloud.is_cloud());
        assert!(!Deployment::Server.is_cloud());
    }

    #[test]
    fn test_deployment_serde() {
        let json = serde_json::to_string(&Deployment::Server).unwrap();
        assert_eq!(json, "\"server\"");
        let parsed: Deployment = serde_json::from_str("\"cloud\"").unwrap();
        assert_eq!(parsed, Deployment::Cloud);
    }

    #[test]
    fn test_operation_names() {
        assert_eq!(ApiOperation::ContentSearch.to_string(), "content_search");
        assert_eq!(ApiOperation::GroupMembers.as_str(), "group_members");
    }
}
