//! Shared client state injected into every service node.
//!
//! [`ClientContext`] holds everything a service needs to issue a gated call:
//! the base URL, the default headers, the hook registry, the auth gate, and
//! the transport. The client root owns it behind an `Arc` and hands a clone to
//! each node it builds, so there is no process-global lookup.

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, info_span, Instrument};

use crate::{
    AuthGate, CallId, HookRegistry, HttpMethod, PapiError, Request, Response, ServiceName,
    Transport,
};

pub struct ClientContext {
    base: String,
    headers: Vec<(String, String)>,
    hooks: RwLock<HookRegistry>,
    auth: AuthGate,
    transport: Arc<dyn Transport>,
}

impl ClientContext {
    /// Creates a context with default hooks and no auth callback.
    pub fn new(
        base: impl Into<String>,
        headers: Vec<(String, String)>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            base: base.into(),
            headers,
            hooks: RwLock::new(HookRegistry::new()),
            auth: AuthGate::new(),
            transport,
        }
    }

    /// Returns the base URL every root service path is prefixed with.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Returns the default headers attached to every request.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn hooks(&self) -> &RwLock<HookRegistry> {
        &self.hooks
    }

    pub fn auth(&self) -> &AuthGate {
        &self.auth
    }

    /// Issues a request for `service` through the auth gate.
    ///
    /// This is the only route from a service method to the transport.
    pub async fn send(
        &self,
        service: &ServiceName,
        method: HttpMethod,
        url: String,
        payload: Option<Value>,
    ) -> Result<Response, PapiError> {
        let call_id = CallId::new_random();
        let span = info_span!(
            "papi.call",
            call_id = %call_id,
            service = %service,
            method = %method,
            url = %url,
        );

        async move {
            let endpoint = url.clone();
            self.auth
                .guard(self, service, &endpoint, || self.perform(method, url, payload))
                .await
        }
        .instrument(span)
        .await
    }

    async fn perform(
        &self,
        method: HttpMethod,
        url: String,
        payload: Option<Value>,
    ) -> Result<Response, PapiError> {
        let request = Request {
            method,
            url,
            headers: self.headers.clone(),
            payload,
        };

        debug!("Sending request");
        let response = self.transport.perform(request).await?;
        debug!(status = response.status, "Received response");
        Ok(response)
    }
}

impl std::fmt::Debug for ClientContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientContext")
            .field("base", &self.base)
            .field("headers", &self.headers)
            .field("hooks", &*self.hooks.read())
            .field("auth", &self.auth)
            .finish_non_exhaustive()
    }
}
