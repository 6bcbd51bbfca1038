//! HTTP transport used by the widgets.
//!
//! Every network round-trip a widget makes goes through [`Transport`], so the
//! controllers never talk to `reqwest` directly.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::config::BackendConfig;
use crate::error::{AppError, AppResult};
use crate::query::QueryParams;

/// A completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Reason phrase, e.g. `Not Found`.
    pub status_text: String,
    /// Response body.
    pub body: String,
}

impl HttpResponse {
    /// Build a `200 OK` response.
    #[must_use]
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            status_text: "OK".to_string(),
            body: body.into(),
        }
    }

    /// Build a response with an arbitrary status.
    #[must_use]
    pub fn with_status(status: u16, status_text: impl Into<String>) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            body: String::new(),
        }
    }

    /// Whether the status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Turn a non-2xx response into [`AppError::Status`].
    pub fn error_for_status(self) -> AppResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(AppError::Status {
                status: self.status,
                text: self.status_text,
            })
        }
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> AppResult<T> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Asynchronous HTTP seam between widgets and the backend.
///
/// Non-2xx answers are returned as responses, not errors; only transport
/// failures are reported as `Err`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// `GET url?query`.
    async fn get(&self, url: &str, query: &QueryParams) -> AppResult<HttpResponse>;

    /// `POST url` with a form-encoded body.
    async fn post_form(&self, url: &str, fields: &[(String, String)]) -> AppResult<HttpResponse>;
}

/// [`Transport`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    /// Create a transport for the configured backend.
    pub fn new(config: &BackendConfig) -> AppResult<Self> {
        let mut builder = Client::builder().user_agent(&config.user_agent);
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| AppError::Config(format!("failed to create HTTP client: {e}")))?;
        let base_url = Url::parse(&config.base_url)?;

        Ok(Self { client, base_url })
    }

    /// Resolve a possibly relative endpoint against the backend origin.
    pub fn resolve(&self, url: &str) -> AppResult<Url> {
        Ok(self.base_url.join(url)?)
    }

    async fn into_response(response: reqwest::Response) -> AppResult<HttpResponse> {
        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or_default().to_string();
        let body = response.text().await?;
        if !status.is_success() {
            debug!(status = status.as_u16(), "Backend returned non-success status");
        }
        Ok(HttpResponse {
            status: status.as_u16(),
            status_text,
            body,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str, query: &QueryParams) -> AppResult<HttpResponse> {
        let target = self.resolve(url)?;
        debug!(url = %target, "GET");
        let response = self
            .client
            .get(target.clone())
            .query(query)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %target, error = %e, "GET failed");
                AppError::from(e)
            })?;
        Self::into_response(response).await
    }

    async fn post_form(&self, url: &str, fields: &[(String, String)]) -> AppResult<HttpResponse> {
        let target = self.resolve(url)?;
        debug!(url = %target, fields = fields.len(), "POST");
        let response = self
            .client
            .post(target.clone())
            .form(fields)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %target, error = %e, "POST failed");
                AppError::from(e)
            })?;
        Self::into_response(response).await
    }
}
