//! Confluence retrieval client
//!
//! `ConfluenceClient` is the public face of the crate. Each operation builds
//! the deployment-specific endpoint, routes every request through the retry
//! wrapper, and hands back either a lazy [`RecordStream`] or a single value.
//!
//! # Example
//!
//! ```ignore
//! use futures::TryStreamExt;
//! use solidafy_confluence::ConfluenceClient;
//!
//! let client = ConfluenceClient::new(http_config, RetryConfig::default(), Deployment::Cloud)?;
//! let pages: Vec<_> = client
//!     .paginated_cql_retrieval("type=page", Some("version"), None)
//!     .try_collect()
//!     .await?;
//! ```

use crate::error::{Error, Result};
use crate::expansion::resolve;
use crate::http::{ApiClient, HttpClientConfig, HttpTransport, RetryConfig, RetryPolicy, Transport};
use crate::pagination::{paginate, Cursor};
use crate::records::{group, ConfluenceUser};
use crate::types::{ApiOperation, Deployment, RecordStream};
use futures::{StreamExt, TryStreamExt};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info_span, warn, Instrument, Span};

/// Client for the Confluence REST API with pagination and retry built in
#[derive(Debug, Clone)]
pub struct ConfluenceClient {
    api: ApiClient,
    deployment: Deployment,
    span: Span,
}

impl ConfluenceClient {
    /// Build a client over the reqwest transport
    pub fn new(config: HttpClientConfig, retry: RetryConfig, deployment: Deployment) -> Result<Self> {
        let base_url = config.base_url.clone().unwrap_or_default();
        let transport = HttpTransport::with_config(config)?;
        let span = info_span!("confluence_client", base_url = %base_url, %deployment);
        Ok(Self::from_transport(Arc::new(transport), RetryPolicy::new(retry), deployment).with_span(span))
    }

    /// Build a client over any transport
    pub fn from_transport(
        transport: Arc<dyn Transport>,
        retry: RetryPolicy,
        deployment: Deployment,
    ) -> Self {
        Self {
            api: ApiClient::new(transport, retry),
            deployment,
            span: info_span!("confluence_client", %deployment),
        }
    }

    /// Replace the span every operation runs in
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Get the deployment flavour
    pub fn deployment(&self) -> Deployment {
        self.deployment
    }

    // ========================================================================
    // Generic pagination
    // ========================================================================

    /// Paginate any cursor-bearing endpoint.
    ///
    /// With `auto_paginate` the next `start` is computed from the result
    /// count and server cursors are ignored; use it only for endpoints whose
    /// cursors are known to be broken.
    pub fn paginate_url(
        &self,
        url: impl Into<Cursor>,
        limit: Option<u32>,
        auto_paginate: bool,
    ) -> RecordStream<Value> {
        self.paginate_as(ApiOperation::Custom, url, limit, auto_paginate)
    }

    fn paginate_as(
        &self,
        operation: ApiOperation,
        url: impl Into<Cursor>,
        limit: Option<u32>,
        auto_paginate: bool,
    ) -> RecordStream<Value> {
        self.span
            .in_scope(|| paginate(self.api.clone(), operation, url, limit, auto_paginate))
    }

    // ========================================================================
    // Content
    // ========================================================================

    /// Search content with CQL.
    ///
    /// `limit` is the page size; every matching record is yielded.
    pub fn paginated_cql_retrieval(
        &self,
        cql: &str,
        expand: Option<&str>,
        limit: Option<u32>,
    ) -> RecordStream<Value> {
        let url = format!(
            "rest/api/content/search?cql={}{}",
            urlencoding::encode(cql),
            expand_param(expand)
        );
        self.paginate_as(ApiOperation::ContentSearch, url, limit, false)
    }

    /// Search content with CQL and pull in every page of every expansion.
    ///
    /// `limit` applies to the top-level search only; nested expansions are
    /// fetched with the default page size.
    pub fn cql_paginate_all_expansions(
        &self,
        cql: &str,
        expand: Option<&str>,
        limit: Option<u32>,
    ) -> RecordStream<Value> {
        let api = self.api.clone();
        let span = self.span.clone();
        self.paginated_cql_retrieval(cql, expand, limit)
            .and_then(move |record| {
                let api = api.clone();
                let span = span.clone();
                async move { resolve(&api, record).instrument(span).await }
            })
            .boxed()
    }

    // ========================================================================
    // Users and groups
    // ========================================================================

    /// List every user.
    ///
    /// Cloud goes through `search/user`, whose cursors over-advance, so the
    /// next page is computed client side. Server uses `user/list`, which only
    /// data center deployments expose.
    pub fn paginated_user_retrieval(
        &self,
        expand: Option<&str>,
        limit: Option<u32>,
    ) -> RecordStream<ConfluenceUser> {
        match self.deployment {
            Deployment::Cloud => {
                let url = format!(
                    "rest/api/search/user?cql={}{}",
                    urlencoding::encode("type=user"),
                    expand_param(expand)
                );
                self.paginate_as(ApiOperation::UserSearch, url, limit, true)
                    .map(|result| result.and_then(|r| ConfluenceUser::from_cloud_search_result(&r)))
                    .boxed()
            }
            Deployment::Server => self
                .paginate_as(ApiOperation::UserList, "rest/api/user/list", limit, false)
                .map(|result| result.and_then(|u| ConfluenceUser::from_server_user(&u)))
                .boxed(),
        }
    }

    /// List the groups a user belongs to (`accountId` on cloud, user key on
    /// server)
    pub fn paginated_groups_by_user(&self, user_id: &str, limit: Option<u32>) -> RecordStream<Value> {
        let url = group::memberof_path(self.deployment, user_id);
        self.paginate_as(ApiOperation::GroupsByUser, url, limit, false)
    }

    /// List every group
    pub fn paginated_groups(&self, limit: Option<u32>) -> RecordStream<Value> {
        self.paginate_as(ApiOperation::Groups, "rest/api/group", limit, false)
    }

    /// List the members of a group.
    ///
    /// Fails up front on server for group names containing `/`.
    pub fn paginated_group_members(
        &self,
        group_name: &str,
        limit: Option<u32>,
    ) -> Result<RecordStream<Value>> {
        let url = group::members_path(self.deployment, group_name)?;
        Ok(self.paginate_as(ApiOperation::GroupMembers, url, limit, false))
    }

    // ========================================================================
    // Single requests
    // ========================================================================

    /// Fetch the permission sets of a space over JSON-RPC (server only).
    ///
    /// A response without a `result` list is logged and treated as empty.
    pub async fn get_all_space_permissions_server(&self, space_key: &str) -> Result<Vec<Value>> {
        async {
            let body = group::space_permission_request(space_key);
            let response = self
                .api
                .post(ApiOperation::SpacePermissions, group::JSON_RPC_PATH, &body)
                .await?;
            let response = response.json()?;
            debug!("jsonrpc response: {}", response);

            match response.get("result") {
                Some(Value::Array(permissions)) if !permissions.is_empty() => Ok(permissions.clone()),
                _ => {
                    warn!(
                        space_key,
                        "No jsonrpc response for space permissions for space {}\nResponse: {}",
                        space_key,
                        response
                    );
                    Ok(Vec::new())
                }
            }
        }
        .instrument(self.span.clone())
        .await
    }

    /// Fetch the authenticated user, optionally expanding e.g. `status`
    pub async fn get_current_user(&self, expand: Option<&str>) -> Result<Value> {
        async {
            let query: Vec<(String, String)> = expand
                .map(|e| vec![("expand".to_string(), e.to_string())])
                .unwrap_or_default();
            let response = self
                .api
                .get(ApiOperation::CurrentUser, "rest/api/user/current", &query)
                .await
                .map_err(|err| match err {
                    err @ Error::HttpStatus { status: 403, .. } => {
                        Error::permission_denied("The calling user does not have permission", err)
                    }
                    other => other,
                })?;
            response.json()
        }
        .instrument(self.span.clone())
        .await
    }

    /// Fetch one page of spaces as the raw envelope
    pub async fn get_spaces(&self, limit: u32) -> Result<Value> {
        async {
            let query = [("limit".to_string(), limit.to_string())];
            self.api
                .get(ApiOperation::Spaces, "rest/api/space", &query)
                .await?
                .json()
        }
        .instrument(self.span.clone())
        .await
    }
}

fn expand_param(expand: Option<&str>) -> String {
    match expand {
        Some(expand) if !expand.is_empty() => format!("&expand={expand}"),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests;
