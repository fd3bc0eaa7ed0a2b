//! Tests for the Confluence client

use super::*;
use crate::http::mock::ScriptedTransport;
use futures::TryStreamExt;
use pretty_assertions::assert_eq;
use serde_json::json;

fn client(transport: &Arc<ScriptedTransport>, deployment: Deployment) -> ConfluenceClient {
    ConfluenceClient::from_transport(transport.clone(), RetryPolicy::default(), deployment)
}

#[tokio::test]
async fn test_cql_retrieval_builds_search_url() {
    let transport = Arc::new(
        ScriptedTransport::new().json(json!({"results": [{"id": "1"}, {"id": "2"}], "_links": {}})),
    );

    let records: Vec<Value> = client(&transport, Deployment::Cloud)
        .paginated_cql_retrieval("type=page AND space=ENG", Some("version,space"), Some(25))
        .try_collect()
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(
        transport.requests(),
        vec!["rest/api/content/search?cql=type%3Dpage%20AND%20space%3DENG&expand=version,space&limit=25"]
    );
}

#[tokio::test]
async fn test_cql_without_expand() {
    let transport = Arc::new(ScriptedTransport::new().json(json!({"results": []})));

    let records: Vec<Value> = client(&transport, Deployment::Server)
        .paginated_cql_retrieval("type=blogpost", None, None)
        .try_collect()
        .await
        .unwrap();

    assert!(records.is_empty());
    assert_eq!(
        transport.requests(),
        vec!["rest/api/content/search?cql=type%3Dblogpost&limit=1000"]
    );
}

#[tokio::test]
async fn test_all_expansions_resolves_each_record() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .json(json!({
                "results": [
                    {"id": "1", "children": {"page": {
                        "results": [{"id": "c1"}],
                        "_links": {"next": "/rest/api/content/1/child/page?start=1"}
                    }}},
                    {"id": "2"}
                ],
                "_links": {}
            }))
            .json(json!({"results": [{"id": "c2"}], "_links": {}})),
    );

    let records: Vec<Value> = client(&transport, Deployment::Cloud)
        .cql_paginate_all_expansions("type=page", Some("children.page"), Some(50))
        .try_collect()
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(
        records[0]["children"]["page"]["results"],
        json!([{"id": "c1"}, {"id": "c2"}])
    );
    assert_eq!(
        transport.requests()[1],
        "/rest/api/content/1/child/page?start=1&limit=1000"
    );
}

#[tokio::test]
async fn test_cloud_users_use_search_with_synthesized_cursors() {
    let user = |id: &str| {
        json!({"user": {"accountId": id, "displayName": id.to_uppercase(), "accountType": "atlassian"}})
    };
    let transport = Arc::new(
        ScriptedTransport::new()
            .json(json!({
                "results": [user("a"), user("b")],
                "_links": {"next": "/rest/api/search/user?cql=type=user&limit=2&start=8"}
            }))
            .json(json!({"results": [], "_links": {}})),
    );

    let users: Vec<ConfluenceUser> = client(&transport, Deployment::Cloud)
        .paginated_user_retrieval(None, Some(2))
        .try_collect()
        .await
        .unwrap();

    assert_eq!(
        users.iter().map(|u| u.user_id.as_str()).collect::<Vec<_>>(),
        vec!["a", "b"]
    );
    assert_eq!(users[0].display_name, "A");
    assert_eq!(users[0].username, None);
    assert_eq!(
        transport.requests(),
        vec![
            "rest/api/search/user?cql=type%3Duser&limit=2",
            "rest/api/search/user?cql=type%3Duser&limit=2&start=2",
        ]
    );
}

#[tokio::test]
async fn test_server_users_use_user_list() {
    let transport = Arc::new(ScriptedTransport::new().json(json!({
        "results": [{"username": "admin", "userKey": "k1", "displayName": "Admin"}],
        "_links": {}
    })));

    let users: Vec<ConfluenceUser> = client(&transport, Deployment::Server)
        .paginated_user_retrieval(Some("status"), None)
        .try_collect()
        .await
        .unwrap();

    assert_eq!(
        users,
        vec![ConfluenceUser {
            user_id: "k1".to_string(),
            username: Some("admin".to_string()),
            display_name: "Admin".to_string(),
            email: None,
            account_type: "user".to_string(),
        }]
    );
    assert_eq!(transport.requests(), vec!["rest/api/user/list?limit=1000"]);
}

#[tokio::test]
async fn test_malformed_user_ends_stream() {
    let transport = Arc::new(
        ScriptedTransport::new().json(json!({"results": [{"title": "no user"}], "_links": {}})),
    );

    let result: Result<Vec<ConfluenceUser>> = client(&transport, Deployment::Cloud)
        .paginated_user_retrieval(None, None)
        .try_collect()
        .await;

    assert!(matches!(result, Err(Error::MalformedResponse { .. })));
}

#[tokio::test]
async fn test_group_endpoints() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .json(json!({"results": [{"name": "confluence-users"}]}))
            .json(json!({"results": [{"name": "admins"}]}))
            .json(json!({"results": [{"accountId": "a"}]})),
    );
    let client = client(&transport, Deployment::Cloud);

    let groups: Vec<Value> = client.paginated_groups(None).try_collect().await.unwrap();
    assert_eq!(groups, vec![json!({"name": "confluence-users"})]);

    let memberof: Vec<Value> = client
        .paginated_groups_by_user("712020:abc", Some(200))
        .try_collect()
        .await
        .unwrap();
    assert_eq!(memberof.len(), 1);

    let members: Vec<Value> = client
        .paginated_group_members("team/eng", None)
        .unwrap()
        .try_collect()
        .await
        .unwrap();
    assert_eq!(members.len(), 1);

    assert_eq!(
        transport.requests(),
        vec![
            "rest/api/group?limit=1000",
            "rest/api/user/memberof?accountId=712020%3Aabc&limit=200",
            "rest/api/group/team%2Feng/member?limit=1000",
        ]
    );
}

#[tokio::test]
async fn test_server_group_members_with_slash_is_unsupported() {
    let transport = Arc::new(ScriptedTransport::new());

    let result = client(&transport, Deployment::Server).paginated_group_members("team/eng", None);

    assert!(matches!(result, Err(Error::Unsupported { .. })));
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_space_permissions() {
    let transport = Arc::new(ScriptedTransport::new().json(json!({
        "jsonrpc": "2.0",
        "id": 7,
        "result": [{"type": "VIEWSPACE", "spacePermissions": []}]
    })));

    let permissions = client(&transport, Deployment::Server)
        .get_all_space_permissions_server("ENG")
        .await
        .unwrap();

    assert_eq!(permissions, vec![json!({"type": "VIEWSPACE", "spacePermissions": []})]);
    assert_eq!(transport.requests(), vec!["rpc/json-rpc/confluenceservice-v2"]);
    assert_eq!(transport.bodies()[0]["params"], json!(["ENG"]));
    assert_eq!(transport.bodies()[0]["method"], "getSpacePermissionSets");
}

#[tokio::test]
async fn test_space_permissions_missing_result_is_empty() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .json(json!({"jsonrpc": "2.0", "id": 7, "error": {"message": "no such space"}}))
            .json(json!({"jsonrpc": "2.0", "id": 7, "result": []})),
    );
    let client = client(&transport, Deployment::Server);

    assert!(client.get_all_space_permissions_server("NOPE").await.unwrap().is_empty());
    assert!(client.get_all_space_permissions_server("EMPTY").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_current_user() {
    let transport = Arc::new(
        ScriptedTransport::new().json(json!({"accountId": "a", "status": "Active"})),
    );

    let user = client(&transport, Deployment::Cloud)
        .get_current_user(Some("status"))
        .await
        .unwrap();

    assert_eq!(user["status"], "Active");
    assert_eq!(transport.requests(), vec!["rest/api/user/current?expand=status"]);
}

#[tokio::test]
async fn test_current_user_forbidden() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .status(403, "user lacks 'view' on space ENG")
            .status(404, "Not Found"),
    );
    let client = client(&transport, Deployment::Cloud);

    let err = client.get_current_user(None).await.unwrap_err();
    let Error::PermissionDenied { source, .. } = &err else {
        panic!("expected permission error, got {err}");
    };
    assert!(matches!(
        source.as_ref(),
        Error::HttpStatus { status: 403, body, .. } if body == "user lacks 'view' on space ENG"
    ));
    assert_eq!(err.status(), Some(403));
    assert!(err.url().is_some_and(|url| url.contains("rest/api/user/current")));

    let err = client.get_current_user(None).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_get_spaces() {
    let transport = Arc::new(ScriptedTransport::new().json(json!({"results": [{"key": "ENG"}]})));

    let spaces = client(&transport, Deployment::Cloud).get_spaces(1).await.unwrap();

    assert_eq!(spaces["results"][0]["key"], "ENG");
    assert_eq!(transport.requests(), vec!["rest/api/space?limit=1"]);
}

#[tokio::test]
async fn test_paginate_url_is_generic() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .json(json!({"results": [1, 2], "_links": {"next": "/rest/api/space?limit=2&start=2"}}))
            .json(json!({"results": [3], "_links": {}})),
    );

    let values: Vec<Value> = client(&transport, Deployment::Cloud)
        .paginate_url("rest/api/space", Some(2), false)
        .try_collect()
        .await
        .unwrap();

    assert_eq!(values, vec![json!(1), json!(2), json!(3)]);
}
