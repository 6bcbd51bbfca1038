//! Test utilities for widget code.
//!
//! Provides an in-memory [`Transport`] with canned responses and a call log.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{AppError, AppResult};
use crate::query::QueryParams;
use crate::transport::{HttpResponse, Transport};

/// A request seen by [`StubTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    /// A `GET` with its query parameters.
    Get { url: String, query: QueryParams },
    /// A form `POST` with its fields.
    Post {
        url: String,
        fields: Vec<(String, String)>,
    },
}

impl RecordedCall {
    /// The requested URL.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Get { url, .. } | Self::Post { url, .. } => url,
        }
    }
}

/// Transport that answers from a table of canned responses.
///
/// Each URL holds a queue; the last response for a URL is reused once the
/// queue would otherwise run dry. Unknown URLs answer `404 Not Found`.
#[derive(Debug, Default)]
pub struct StubTransport {
    responses: Mutex<HashMap<String, VecDeque<HttpResponse>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl StubTransport {
    /// Create an empty stub.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for `url`.
    #[must_use]
    pub fn respond(self, url: &str, response: HttpResponse) -> Self {
        self.push(url, response);
        self
    }

    /// Queue a `200 OK` JSON body for `url`.
    #[must_use]
    pub fn respond_json(self, url: &str, body: &serde_json::Value) -> Self {
        self.respond(url, HttpResponse::ok(body.to_string()))
    }

    /// Queue a response for `url` on an already shared stub.
    pub fn push(&self, url: &str, response: HttpResponse) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.entry(url.to_string()).or_default().push_back(response);
        }
    }

    /// Every request made so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of requests made to `url`.
    #[must_use]
    pub fn count(&self, url: &str) -> usize {
        self.calls().iter().filter(|c| c.url() == url).count()
    }

    fn next_response(&self, url: &str) -> AppResult<HttpResponse> {
        let mut responses = self
            .responses
            .lock()
            .map_err(|_| AppError::Internal("stub transport poisoned".to_string()))?;
        let Some(queue) = responses.get_mut(url) else {
            return Ok(HttpResponse::with_status(404, "Not Found"));
        };
        let response = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        Ok(response.unwrap_or_else(|| HttpResponse::with_status(404, "Not Found")))
    }

    fn record(&self, call: RecordedCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn get(&self, url: &str, query: &QueryParams) -> AppResult<HttpResponse> {
        self.record(RecordedCall::Get {
            url: url.to_string(),
            query: query.clone(),
        });
        self.next_response(url)
    }

    async fn post_form(&self, url: &str, fields: &[(String, String)]) -> AppResult<HttpResponse> {
        self.record(RecordedCall::Post {
            url: url.to_string(),
            fields: fields.to_vec(),
        });
        self.next_response(url)
    }
}
