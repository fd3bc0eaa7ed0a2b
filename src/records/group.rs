//! Group and space permission request builders

use crate::error::{Error, Result};
use crate::types::Deployment;
use serde_json::{json, Value};

/// JSON-RPC endpoint exposed by server deployments
pub const JSON_RPC_PATH: &str = "rpc/json-rpc/confluenceservice-v2";

/// Path listing the groups a user belongs to.
///
/// Cloud identifies users by `accountId`, server by `key` (the user key).
pub fn memberof_path(deployment: Deployment, user_id: &str) -> String {
    let field = if deployment.is_cloud() { "accountId" } else { "key" };
    format!(
        "rest/api/user/memberof?{field}={}",
        urlencoding::encode(user_id)
    )
}

/// Path listing the members of a group.
///
/// Server deployments cannot address a group whose name contains `/`, encoded
/// or not, so such names are rejected up front.
pub fn members_path(deployment: Deployment, group_name: &str) -> Result<String> {
    if !deployment.is_cloud() && group_name.contains('/') {
        return Err(Error::unsupported(format!(
            "group members cannot be listed on server for group names containing '/': {group_name}"
        )));
    }
    Ok(format!(
        "rest/api/group/{}/member",
        urlencoding::encode(group_name)
    ))
}

/// JSON-RPC 2.0 body requesting a space's permission sets
pub fn space_permission_request(space_key: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "method": "getSpacePermissionSets",
        "id": 7,
        "params": [space_key],
    })
}
