//! The client root.
//!
//! [`Papi`] wires the hook registry, auth gate, transport, and top-level
//! service nodes together. It is the only place services, hooks, and auth
//! callbacks are registered.

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, info};

use crate::{
    auth_fn, AuthFn, ClientConfig, ClientContext, Hook, PapiError, Response, ServiceName,
    ServiceNode, ServiceSpec, Transport,
};

pub struct Papi {
    context: Arc<ClientContext>,
    services: IndexMap<ServiceName, ServiceNode>,
}

impl Papi {
    /// Builds a client from `config`.
    ///
    /// Headers are applied first, then each service is registered in order,
    /// then the auth callback (if any) is installed.
    ///
    /// # Errors
    ///
    /// - [`PapiError::MissingBaseUrl`] if `config.base` is absent or empty.
    /// - Any error [`register_service`](Self::register_service) raises for the
    ///   configured services.
    pub fn new(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self, PapiError> {
        let base = config
            .base
            .filter(|b| !b.is_empty())
            .ok_or(PapiError::MissingBaseUrl)?;

        let mut papi = Self {
            context: Arc::new(ClientContext::new(base, config.headers, transport)),
            services: IndexMap::new(),
        };

        for service in config.services {
            papi.register_service(service)?;
        }

        if let Some(callback) = config.auth_setup {
            papi.context.auth().register(callback);
        }

        info!(
            base = papi.base(),
            services = papi.services.len(),
            headers = papi.context.headers().len(),
            "Client constructed"
        );
        Ok(papi)
    }

    /// Builds a client from a JSON configuration document.
    ///
    /// # Errors
    ///
    /// - [`PapiError::MissingConfig`] if `value` is `null`.
    /// - [`PapiError::InvalidArgument`] if the document is not a valid config.
    /// - Anything [`Papi::new`] raises.
    pub fn from_value(value: Value, transport: Arc<dyn Transport>) -> Result<Self, PapiError> {
        if value.is_null() {
            return Err(PapiError::MissingConfig);
        }
        let config: ClientConfig = serde_json::from_value(value)
            .map_err(|e| PapiError::invalid_argument(format!("Invalid API configuration: {e}")))?;
        Self::new(config, transport)
    }

    pub fn base(&self) -> &str {
        self.context.base()
    }

    pub fn context(&self) -> &Arc<ClientContext> {
        &self.context
    }

    // -----------------------------------------------------------------------
    // Services
    // -----------------------------------------------------------------------

    /// Registers a top-level service rooted at the client base URL.
    ///
    /// # Errors
    ///
    /// - [`PapiError::MissingServiceName`] if the spec (or a nested spec) has
    ///   no name.
    /// - [`PapiError::DuplicateService`] if a root service with this name
    ///   exists, or two nested siblings collide.
    ///
    /// On error the client is left unchanged.
    pub fn register_service(
        &mut self,
        spec: impl Into<ServiceSpec>,
    ) -> Result<&ServiceNode, PapiError> {
        let spec = spec.into();
        if self.services.contains_key(spec.name.as_str()) {
            return Err(PapiError::DuplicateService { name: spec.name });
        }

        let node = ServiceNode::build(spec, self.context.base(), &self.context)?;
        debug!(service = %node.name(), path = node.path(), "Registered service");

        let (index, _) = self.services.insert_full(node.name().clone(), node);
        Ok(&self.services[index])
    }

    pub fn service(&self, name: &str) -> Option<&ServiceNode> {
        self.services.get(name)
    }

    /// Root services in registration order.
    pub fn services(&self) -> impl Iterator<Item = &ServiceNode> {
        self.services.values()
    }

    // -----------------------------------------------------------------------
    // Auth and hooks
    // -----------------------------------------------------------------------

    /// Replaces the active auth callback.
    pub fn register_auth_setup<F>(&self, callback: F)
    where
        F: Fn(&ClientContext, &ServiceName, &str) -> bool + Send + Sync + 'static,
    {
        self.context.auth().register(auth_fn(callback));
    }

    /// Returns the active auth callback.
    pub fn auth(&self) -> Option<AuthFn> {
        self.context.auth().callback()
    }

    /// Overrides the hook named `name`. See [`crate::HookRegistry::register`].
    pub fn register_hook<F>(&self, name: &str, callback: F) -> Result<(), PapiError>
    where
        F: Fn() -> Result<Response, PapiError> + Send + Sync + 'static,
    {
        self.context.hooks().write().register(name, Arc::new(callback))
    }

    /// Undoes the latest override of `name`. See [`crate::HookRegistry::deregister`].
    pub fn deregister_hook(&self, name: &str) -> Result<(), PapiError> {
        self.context.hooks().write().deregister(name)
    }

    /// Invokes the active implementation of `hook` directly.
    pub fn run_hook(&self, hook: Hook) -> Result<Response, PapiError> {
        let callback = self.context.hooks().read().active(hook);
        callback()
    }
}

impl std::fmt::Debug for Papi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Papi")
            .field("context", &self.context)
            .field("services", &self.services)
            .finish()
    }
}
