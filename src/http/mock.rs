//! In-memory transport for unit tests

use super::client::{HttpResponse, Transport};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Replays queued responses in order and records every request path
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<HttpResponse>>>,
    requests: Mutex<Vec<String>>,
    bodies: Mutex<Vec<Value>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue a 200 with a JSON body
    pub(crate) fn json(self, body: Value) -> Self {
        self.respond(HttpResponse::new(200, "", body.to_string()))
    }

    /// Queue a response with an arbitrary status and text body
    pub(crate) fn status(self, status: u16, body: &str) -> Self {
        self.respond(HttpResponse::new(status, "", body))
    }

    /// Queue a 429 carrying `Retry-After`
    pub(crate) fn throttled(self, retry_after: &str) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_str(retry_after).unwrap());
        self.respond(HttpResponse {
            status: 429,
            headers,
            body: "Rate limit exceeded".to_string(),
            url: String::new(),
        })
    }

    /// Queue a transport failure
    pub(crate) fn fail(self, error: Error) -> Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    pub(crate) fn respond(self, response: HttpResponse) -> Self {
        self.responses.lock().unwrap().push_back(Ok(response));
        self
    }

    /// Paths requested so far, query strings included
    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// JSON bodies posted so far
    pub(crate) fn bodies(&self) -> Vec<Value> {
        self.bodies.lock().unwrap().clone()
    }

    fn next(&self, path: &str) -> Result<HttpResponse> {
        let mut response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("no scripted response left for {path}"))?;
        response.url = path.to_string();
        Ok(response)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, path: &str, query: &[(String, String)]) -> Result<HttpResponse> {
        let mut full = path.to_string();
        for (key, value) in query {
            full.push(if full.contains('?') { '&' } else { '?' });
            full.push_str(&format!("{key}={value}"));
        }
        self.requests.lock().unwrap().push(full.clone());
        self.next(&full)
    }

    async fn post(&self, path: &str, body: &Value) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(path.to_string());
        self.bodies.lock().unwrap().push(body.clone());
        self.next(path)
    }
}
