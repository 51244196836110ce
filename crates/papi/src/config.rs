//! Client construction input.
//!
//! [`ClientConfig`] can be built in code or deserialised from a JSON/TOML
//! document shaped like:
//!
//! ```json
//! {
//!   "base": "https://api.example.com",
//!   "headers": [["Accept", "application/json"]],
//!   "services": ["orders", {"name": "customers", "base": "people"}]
//! }
//! ```
//!
//! The auth callback cannot be expressed in a document and is attached with
//! [`ClientConfig::with_auth_setup`].

use serde::Deserialize;

use crate::{auth_fn, AuthFn, ClientContext, ServiceName, ServiceSpec};

#[derive(Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Base URL prefixed to every root service path. Required.
    #[serde(default)]
    pub base: Option<String>,

    /// Default headers sent with every request, in order.
    #[serde(default)]
    pub headers: Vec<(String, String)>,

    /// Services registered at construction, in order.
    #[serde(default)]
    pub services: Vec<ServiceSpec>,

    /// Auth callback registered after the services.
    #[serde(skip)]
    pub auth_setup: Option<AuthFn>,
}

impl ClientConfig {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: Some(base.into()),
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_service(mut self, service: impl Into<ServiceSpec>) -> Self {
        self.services.push(service.into());
        self
    }

    pub fn with_auth_setup<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ClientContext, &ServiceName, &str) -> bool + Send + Sync + 'static,
    {
        self.auth_setup = Some(auth_fn(callback));
        self
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base", &self.base)
            .field("headers", &self.headers)
            .field("services", &self.services)
            .field("auth_setup", &self.auth_setup.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_deserializes_full_document() {
        let config: ClientConfig = serde_json::from_value(json!({
            "base": "http://x",
            "headers": [["header", "value"]],
            "services": ["widgets", {"name": "orders", "base": "items"}]
        }))
        .unwrap();

        assert_eq!(config.base.as_deref(), Some("http://x"));
        assert_eq!(config.headers, [("header".to_string(), "value".to_string())]);
        assert_eq!(config.services.len(), 2);
        assert!(config.auth_setup.is_none());
    }

    #[test]
    fn test_missing_fields_default() {
        let config: ClientConfig = serde_json::from_value(json!({})).unwrap();
        assert!(config.base.is_none());
        assert!(config.headers.is_empty());
        assert!(config.services.is_empty());
    }

    #[test]
    fn test_builder_collects_in_order() {
        let config = ClientConfig::new("http://x")
            .with_header("a", "1")
            .with_header("b", "2")
            .with_service("widgets")
            .with_auth_setup(|_, _, _| true);

        assert_eq!(config.headers[1].0, "b");
        assert_eq!(config.services[0].name, "widgets");
        assert!(config.auth_setup.is_some());
    }
}
