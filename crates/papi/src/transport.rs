//! The transport port.
//!
//! The core never issues network requests itself. Every gated call ends in a
//! single [`Transport::perform`] invocation; the infrastructure crate that
//! implements this trait owns connection handling, TLS, timeouts, and response
//! decoding. The core passes the [`Response`] through without interpreting it.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::PapiError;

// ---------------------------------------------------------------------------
// Request / response
// ---------------------------------------------------------------------------

/// HTTP verb of an outgoing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// Returns the verb as it appears on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request handed to the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: HttpMethod,
    /// Absolute URL (client base + service path + optional id).
    pub url: String,
    /// Client-wide default headers, in registration order.
    pub headers: Vec<(String, String)>,
    /// JSON body; `None` for bodiless requests.
    pub payload: Option<Value>,
}

/// A response returned by the transport.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Response {
    /// Creates a response with the given status and body and no headers.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Returns `true` for a 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns the first header value matching `name`, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Decodes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

// ---------------------------------------------------------------------------
// Port
// ---------------------------------------------------------------------------

/// Issues HTTP requests on behalf of the client core.
///
/// Implementations must not retry, cache, or rewrite requests; those concerns
/// belong to the implementation's own configuration, not to the core.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs `request` and resolves once the response is available.
    async fn perform(&self, request: Request) -> Result<Response, PapiError>;
}
