//! HTTP transport adapter.
//!
//! Implements the [`papi::Transport`] trait with [`reqwest`]. Requests carry
//! the client's default headers and an optional JSON body; responses are
//! returned with their status, headers, and body text and are never
//! interpreted here. Non-2xx statuses are not errors at this layer.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Connection pooling, TLS, redirects, and timeouts are
//! whatever the supplied [`reqwest::Client`] is configured for. The [`papi`]
//! crate sees only [`papi::Transport`].

use async_trait::async_trait;
use papi::{HttpMethod, PapiError, Request, Response, Transport};
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures of the HTTP adapter.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The underlying HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    /// The request could not be sent or no response arrived.
    #[error("Request {method} {url} failed: {source}")]
    Send {
        method: HttpMethod,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The response body could not be read.
    #[error("Failed to read response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl From<TransportError> for PapiError {
    fn from(err: TransportError) -> Self {
        PapiError::Transport {
            message: err.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// A [`Transport`] backed by a [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Creates a transport with a default-configured client.
    pub fn new() -> Result<Self, TransportError> {
        let client = Client::builder().build().map_err(TransportError::Build)?;
        Ok(Self { client })
    }

    /// Creates a transport over an existing client (custom timeouts, proxies, TLS).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn execute(&self, request: Request) -> Result<Response, TransportError> {
        let Request {
            method,
            url,
            headers,
            payload,
        } = request;

        let mut builder = self.client.request(reqwest_method(method), &url);
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(payload) = &payload {
            builder = builder.json(payload);
        }

        let response = builder
            .send()
            .await
            .map_err(|source| TransportError::Send {
                method,
                url: url.clone(),
                source,
            })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .text()
            .await
            .map_err(|source| TransportError::Body {
                url: url.clone(),
                source,
            })?;

        debug!(%method, url = %url, status, bytes = body.len(), "HTTP exchange complete");
        Ok(Response {
            status,
            headers,
            body,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn perform(&self, request: Request) -> Result<Response, PapiError> {
        Ok(self.execute(request).await?)
    }
}

fn reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}
