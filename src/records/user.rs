//! Normalized user records

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A user as seen by either deployment.
///
/// `user_id` is the `accountId` on cloud and the `userKey` on server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfluenceUser {
    pub user_id: String,
    pub username: Option<String>,
    pub display_name: String,
    pub email: Option<String>,
    #[serde(rename = "type")]
    pub account_type: String,
}

impl ConfluenceUser {
    /// Map one `rest/api/search/user` result (cloud).
    ///
    /// The user sits under the result's `user` key.
    pub fn from_cloud_search_result(result: &Value) -> Result<Self> {
        let user = result
            .get("user")
            .ok_or_else(|| Error::malformed("rest/api/search/user", "result has no `user`"))?;

        Ok(Self {
            user_id: required(user, "accountId")?,
            username: None,
            display_name: required(user, "displayName")?,
            email: optional(user, "email"),
            account_type: required(user, "accountType")?,
        })
    }

    /// Map one `rest/api/user/list` entry (server / data center)
    pub fn from_server_user(user: &Value) -> Result<Self> {
        Ok(Self {
            user_id: required(user, "userKey")?,
            username: Some(required(user, "username")?),
            display_name: required(user, "displayName")?,
            email: None,
            account_type: optional(user, "type").unwrap_or_else(|| "user".to_string()),
        })
    }
}

fn required(user: &Value, field: &str) -> Result<String> {
    optional(user, field)
        .ok_or_else(|| Error::malformed("user record", format!("missing `{field}`")))
}

fn optional(user: &Value, field: &str) -> Option<String> {
    user.get(field).and_then(Value::as_str).map(str::to_string)
}
