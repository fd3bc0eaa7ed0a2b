//! Retrying API caller
//!
//! `ApiClient` is the only path from the rest of the crate to a `Transport`.
//! Every GET and POST goes through [`RetryPolicy::run`] tagged with the
//! [`ApiOperation`] it serves, so no call can skip the retry wrapper.

use super::client::{HttpResponse, Transport};
use super::retry::RetryPolicy;
use crate::error::Result;
use crate::types::ApiOperation;
use serde_json::Value;
use std::sync::Arc;

/// Transport plus retry policy, cheap to clone
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
}

impl ApiClient {
    /// Create an API client over a transport
    pub fn new(transport: Arc<dyn Transport>, retry: RetryPolicy) -> Self {
        Self { transport, retry }
    }

    /// GET with retries. Non-2xx responses that survive the retry policy are
    /// returned as `Error::HttpStatus`.
    pub async fn get(
        &self,
        operation: ApiOperation,
        path: &str,
        query: &[(String, String)],
    ) -> Result<HttpResponse> {
        let transport = Arc::clone(&self.transport);
        let path = path.to_string();
        let query = query.to_vec();
        self.retry
            .run(operation, move || {
                let transport = Arc::clone(&transport);
                let path = path.clone();
                let query = query.clone();
                async move { transport.get(&path, &query).await?.error_for_status() }
            })
            .await
    }

    /// POST a JSON body with retries
    pub async fn post(
        &self,
        operation: ApiOperation,
        path: &str,
        body: &Value,
    ) -> Result<HttpResponse> {
        let transport = Arc::clone(&self.transport);
        let path = path.to_string();
        let body = body.clone();
        self.retry
            .run(operation, move || {
                let transport = Arc::clone(&transport);
                let path = path.clone();
                let body = body.clone();
                async move { transport.post(&path, &body).await?.error_for_status() }
            })
            .await
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}
