//! Service nodes.
//!
//! A [`ServiceNode`] is one REST resource: a resolved path, a table of callable
//! methods, named endpoints, and nested child services. Every node starts with
//! the four standard methods (`get`, `create`, `update`, `delete`); entries in
//! the spec's `methods` table replace them by name or add new ones.
//!
//! Standard methods always go through [`ClientContext::send`], which consults
//! the auth gate before the transport. Custom methods receive a
//! [`ServiceCall`] whose [`send`](ServiceCall::send) takes the same route.
//!
//! ## Path resolution
//!
//! | Spec | Parent path | Resolved path |
//! |------|-------------|---------------|
//! | `"orders"` | `http://x` | `http://x/orders` |
//! | `{name: "orders", base: "items"}` | `http://x` | `http://x/items` |
//! | `{name: "lines", base: "/l"}` | `http://x/orders` | `http://x/orders/l` |

use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::{ClientContext, HttpMethod, MethodName, PapiError, Response, ServiceName};

/// A callable installed on a service node.
pub type MethodFn =
    Arc<dyn Fn(ServiceCall) -> BoxFuture<'static, Result<Response, PapiError>> + Send + Sync>;

/// Wraps an async closure as a [`MethodFn`].
pub fn method_fn<F, Fut>(f: F) -> MethodFn
where
    F: Fn(ServiceCall) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, PapiError>> + Send + 'static,
{
    Arc::new(move |call| f(call).boxed())
}

/// The standard methods generated for every node, in installation order.
pub const STANDARD_METHODS: [(&str, HttpMethod); 4] = [
    ("get", HttpMethod::Get),
    ("create", HttpMethod::Post),
    ("update", HttpMethod::Put),
    ("delete", HttpMethod::Delete),
];

fn standard_method(method: HttpMethod) -> MethodFn {
    method_fn(move |call: ServiceCall| call.send(method))
}

/// Prefixes `segment` with `/` unless it already starts with one.
pub(crate) fn normalize_segment(segment: &str) -> String {
    if segment.starts_with('/') {
        segment.to_string()
    } else {
        format!("/{segment}")
    }
}

// ---------------------------------------------------------------------------
// Specs
// ---------------------------------------------------------------------------

/// A named sub-path of a service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawEndpointSpec")]
pub struct EndpointSpec {
    pub name: String,
    /// Path segment; defaults to `name`.
    pub base: Option<String>,
}

impl EndpointSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base: None,
        }
    }

    pub fn base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }
}

impl From<&str> for EndpointSpec {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawEndpointSpec {
    Name(String),
    Spec {
        #[serde(default)]
        name: String,
        #[serde(default)]
        base: Option<String>,
    },
}

impl From<RawEndpointSpec> for EndpointSpec {
    fn from(raw: RawEndpointSpec) -> Self {
        match raw {
            RawEndpointSpec::Name(name) => Self::new(name),
            RawEndpointSpec::Spec { name, base } => Self { name, base },
        }
    }
}

/// Declarative description of a service node.
///
/// Deserialises from either a bare name (`"orders"`) or an object
/// (`{"name": "orders", "base": "items", "endpoints": [...], "services": [...]}`).
/// Custom methods can only be attached through [`ServiceSpec::method`].
#[derive(Clone, Default, Deserialize)]
#[serde(from = "RawServiceSpec")]
pub struct ServiceSpec {
    pub name: String,
    /// Path segment; defaults to `name`.
    pub base: Option<String>,
    pub endpoints: Vec<EndpointSpec>,
    pub services: Vec<ServiceSpec>,
    pub methods: Vec<(String, MethodFn)>,
}

impl ServiceSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<EndpointSpec>) -> Self {
        self.endpoints.push(endpoint.into());
        self
    }

    pub fn service(mut self, service: impl Into<ServiceSpec>) -> Self {
        self.services.push(service.into());
        self
    }

    /// Adds or replaces a method. Later entries win over earlier ones and over
    /// the standard methods.
    pub fn method<F, Fut>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(ServiceCall) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response, PapiError>> + Send + 'static,
    {
        self.with_method(name, method_fn(f))
    }

    pub fn with_method(mut self, name: impl Into<String>, method: MethodFn) -> Self {
        self.methods.push((name.into(), method));
        self
    }
}

impl From<&str> for ServiceSpec {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ServiceSpec {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl std::fmt::Debug for ServiceSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceSpec")
            .field("name", &self.name)
            .field("base", &self.base)
            .field("endpoints", &self.endpoints)
            .field("services", &self.services)
            .field(
                "methods",
                &self.methods.iter().map(|(n, _)| n).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawServiceSpec {
    Name(String),
    Spec {
        #[serde(default)]
        name: String,
        #[serde(default)]
        base: Option<String>,
        #[serde(default)]
        endpoints: Vec<EndpointSpec>,
        #[serde(default)]
        services: Vec<ServiceSpec>,
    },
}

impl From<RawServiceSpec> for ServiceSpec {
    fn from(raw: RawServiceSpec) -> Self {
        match raw {
            RawServiceSpec::Name(name) => Self::new(name),
            RawServiceSpec::Spec {
                name,
                base,
                endpoints,
                services,
            } => Self {
                name,
                base,
                endpoints,
                services,
                methods: Vec::new(),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Call arguments
// ---------------------------------------------------------------------------

/// Arguments of a single method invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    /// Resource id appended to the service path.
    pub id: Option<String>,
    /// JSON body.
    pub payload: Option<Value>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Everything a method needs to issue its request.
#[derive(Clone)]
pub struct ServiceCall {
    context: Arc<ClientContext>,
    service: ServiceName,
    path: String,
    endpoints: Arc<[Endpoint]>,
    args: CallArgs,
}

impl ServiceCall {
    pub fn context(&self) -> &ClientContext {
        &self.context
    }

    pub fn service(&self) -> &ServiceName {
        &self.service
    }

    /// Resolved path of the service being called.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn args(&self) -> &CallArgs {
        &self.args
    }

    /// Service path, with `/{id}` appended when an id was given.
    pub fn url(&self) -> String {
        match &self.args.id {
            Some(id) => format!("{}/{}", self.path, id.trim_start_matches('/')),
            None => self.path.clone(),
        }
    }

    /// Resolved path of the named endpoint of this service.
    pub fn endpoint_url(&self, name: &str) -> Option<&str> {
        self.endpoints
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.path.as_str())
    }

    /// Sends the call to [`url`](Self::url) through the auth gate.
    pub async fn send(self, method: HttpMethod) -> Result<Response, PapiError> {
        let url = self.url();
        self.send_to(method, url).await
    }

    /// Sends the call to an explicit URL through the auth gate.
    pub async fn send_to(self, method: HttpMethod, url: String) -> Result<Response, PapiError> {
        self.context
            .send(&self.service, method, url, self.args.payload)
            .await
    }
}

impl std::fmt::Debug for ServiceCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceCall")
            .field("service", &self.service)
            .field("path", &self.path)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

/// A resolved endpoint of a service node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub name: String,
    pub path: String,
}

/// One REST resource and its callable surface.
pub struct ServiceNode {
    name: ServiceName,
    path: String,
    methods: IndexMap<MethodName, MethodFn>,
    endpoints: Arc<[Endpoint]>,
    children: IndexMap<ServiceName, ServiceNode>,
    context: Arc<ClientContext>,
}

impl ServiceNode {
    /// Builds the node described by `spec` beneath `parent_path`, including
    /// its whole subtree.
    ///
    /// Nothing is attached to a parent here, so a failure anywhere in the
    /// subtree leaves no partial node reachable.
    pub(crate) fn build(
        spec: ServiceSpec,
        parent_path: &str,
        context: &Arc<ClientContext>,
    ) -> Result<Self, PapiError> {
        let name = ServiceName::new(spec.name).ok_or(PapiError::MissingServiceName)?;
        let base = spec
            .base
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| name.as_str().to_string());
        let path = format!("{parent_path}{}", normalize_segment(&base));

        let mut endpoints: Vec<Endpoint> = Vec::with_capacity(spec.endpoints.len());
        for endpoint in spec.endpoints {
            if endpoint.name.is_empty() {
                return Err(PapiError::invalid_argument(format!(
                    "Service {name} has an endpoint without a name."
                )));
            }
            if endpoints.iter().any(|e| e.name == endpoint.name) {
                return Err(PapiError::invalid_argument(format!(
                    "Endpoint {} is already registered on service {name}.",
                    endpoint.name
                )));
            }
            let base = endpoint
                .base
                .filter(|b| !b.is_empty())
                .unwrap_or_else(|| endpoint.name.clone());
            endpoints.push(Endpoint {
                path: format!("{path}{}", normalize_segment(&base)),
                name: endpoint.name,
            });
        }

        let mut methods = IndexMap::new();
        for (method, verb) in STANDARD_METHODS {
            if let Some(method) = MethodName::new(method) {
                methods.insert(method, standard_method(verb));
            }
        }
        for (method, callable) in spec.methods {
            let method = MethodName::new(method).ok_or_else(|| {
                PapiError::invalid_argument(format!(
                    "Service {name} was given a method without a name."
                ))
            })?;
            methods.insert(method, callable);
        }

        let mut children = IndexMap::new();
        for child in spec.services {
            let child = ServiceNode::build(child, &path, context)?;
            if children.contains_key(child.name.as_str()) {
                return Err(PapiError::DuplicateService {
                    name: child.name.to_string(),
                });
            }
            children.insert(child.name.clone(), child);
        }

        debug!(service = %name, path = %path, methods = methods.len(), "Built service node");

        Ok(Self {
            name,
            path,
            methods,
            endpoints: endpoints.into(),
            children,
            context: Arc::clone(context),
        })
    }

    pub fn name(&self) -> &ServiceName {
        &self.name
    }

    /// Absolute path of this resource.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    pub fn endpoint(&self, name: &str) -> Option<&Endpoint> {
        self.endpoints.iter().find(|e| e.name == name)
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Method names in installation order.
    pub fn method_names(&self) -> impl Iterator<Item = &MethodName> {
        self.methods.keys()
    }

    /// Child service by name.
    pub fn service(&self, name: &str) -> Option<&ServiceNode> {
        self.children.get(name)
    }

    /// Child services in registration order.
    pub fn services(&self) -> impl Iterator<Item = &ServiceNode> {
        self.children.values()
    }

    /// Invokes the method registered under `method`.
    ///
    /// # Errors
    ///
    /// [`PapiError::UnknownMethod`] if the node has no such method; otherwise
    /// whatever the method returns.
    pub async fn call(&self, method: &str, args: CallArgs) -> Result<Response, PapiError> {
        let callable = self
            .methods
            .get(method)
            .cloned()
            .ok_or_else(|| PapiError::UnknownMethod {
                service: self.name.to_string(),
                method: method.to_string(),
            })?;

        callable(ServiceCall {
            context: Arc::clone(&self.context),
            service: self.name.clone(),
            path: self.path.clone(),
            endpoints: Arc::clone(&self.endpoints),
            args,
        })
        .await
    }

    pub async fn get(&self, args: CallArgs) -> Result<Response, PapiError> {
        self.call("get", args).await
    }

    pub async fn create(&self, args: CallArgs) -> Result<Response, PapiError> {
        self.call("create", args).await
    }

    pub async fn update(&self, args: CallArgs) -> Result<Response, PapiError> {
        self.call("update", args).await
    }

    pub async fn delete(&self, args: CallArgs) -> Result<Response, PapiError> {
        self.call("delete", args).await
    }
}

impl std::fmt::Debug for ServiceNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceNode")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("endpoints", &self.endpoints)
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::RecordingTransport;
    use crate::ErrorKind;

    fn context(transport: Arc<RecordingTransport>) -> Arc<ClientContext> {
        Arc::new(ClientContext::new("http://x", Vec::new(), transport))
    }

    fn build(spec: impl Into<ServiceSpec>) -> Result<ServiceNode, PapiError> {
        let ctx = context(Arc::new(RecordingTransport::new()));
        ServiceNode::build(spec.into(), ctx.base(), &ctx)
    }

    #[test]
    fn test_path_defaults_to_name() {
        let node = build("orders").unwrap();
        assert_eq!(node.path(), "http://x/orders");
    }

    #[test]
    fn test_explicit_base_is_normalized() {
        assert_eq!(
            build(ServiceSpec::new("orders").base("items")).unwrap().path(),
            "http://x/items"
        );
        assert_eq!(
            build(ServiceSpec::new("orders").base("/items")).unwrap().path(),
            "http://x/items"
        );
    }

    #[test]
    fn test_standard_methods_are_installed() {
        let node = build("orders").unwrap();
        let names: Vec<&str> = node.method_names().map(|m| m.as_str()).collect();
        assert_eq!(names, ["get", "create", "update", "delete"]);
    }

    #[test]
    fn test_missing_name_is_rejected() {
        let err = build(ServiceSpec::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingServiceName);
    }

    #[test]
    fn test_nested_services_resolve_under_parent() {
        let node = build(
            ServiceSpec::new("orders")
                .service("lines")
                .service(ServiceSpec::new("notes").base("n").service("tags")),
        )
        .unwrap();

        assert_eq!(node.service("lines").unwrap().path(), "http://x/orders/lines");
        let notes = node.service("notes").unwrap();
        assert_eq!(notes.path(), "http://x/orders/n");
        assert_eq!(notes.service("tags").unwrap().path(), "http://x/orders/n/tags");

        let order: Vec<&str> = node.services().map(|s| s.name().as_str()).collect();
        assert_eq!(order, ["lines", "notes"]);
    }

    #[test]
    fn test_duplicate_sibling_is_rejected() {
        let err = build(ServiceSpec::new("orders").service("lines").service("lines")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateService);
        assert_eq!(err.to_string(), "Service lines is already registered.");
    }

    #[test]
    fn test_same_name_under_different_parents() {
        let node = build(
            ServiceSpec::new("shop")
                .service(ServiceSpec::new("orders").service("notes"))
                .service(ServiceSpec::new("customers").service("notes")),
        )
        .unwrap();

        assert_eq!(
            node.service("orders").unwrap().service("notes").unwrap().path(),
            "http://x/shop/orders/notes"
        );
        assert_eq!(
            node.service("customers").unwrap().service("notes").unwrap().path(),
            "http://x/shop/customers/notes"
        );
    }

    #[test]
    fn test_endpoints_resolve_against_service_path() {
        let node = build(
            ServiceSpec::new("orders")
                .endpoint("search")
                .endpoint(EndpointSpec::new("export").base("/csv")),
        )
        .unwrap();

        assert_eq!(node.endpoint("search").unwrap().path, "http://x/orders/search");
        assert_eq!(node.endpoint("export").unwrap().path, "http://x/orders/csv");
        assert!(node.endpoint("missing").is_none());
    }

    #[test]
    fn test_duplicate_endpoint_is_rejected() {
        let err = build(ServiceSpec::new("orders").endpoint("search").endpoint("search"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_spec_deserializes_from_string_or_object() {
        let specs: Vec<ServiceSpec> = serde_json::from_value(json!([
            "orders",
            {"name": "customers", "base": "people", "endpoints": ["search", {"name": "x", "base": "y"}],
             "services": ["notes"]}
        ]))
        .unwrap();

        assert_eq!(specs[0].name, "orders");
        assert_eq!(specs[1].base.as_deref(), Some("people"));
        assert_eq!(specs[1].endpoints[1], EndpointSpec::new("x").base("y"));
        assert_eq!(specs[1].services[0].name, "notes");
    }

    #[tokio::test]
    async fn test_standard_methods_map_to_verbs() {
        let transport = Arc::new(RecordingTransport::new());
        let ctx = context(transport.clone());
        let node = ServiceNode::build("orders".into(), ctx.base(), &ctx).unwrap();

        node.get(CallArgs::new()).await.unwrap();
        node.create(CallArgs::new().payload(json!({"qty": 1}))).await.unwrap();
        node.update(CallArgs::new().id("7").payload(json!({"qty": 2}))).await.unwrap();
        node.delete(CallArgs::new().id("7")).await.unwrap();

        let seen: Vec<(HttpMethod, String)> = transport
            .requests()
            .into_iter()
            .map(|r| (r.method, r.url))
            .collect();
        assert_eq!(
            seen,
            [
                (HttpMethod::Get, "http://x/orders".to_string()),
                (HttpMethod::Post, "http://x/orders".to_string()),
                (HttpMethod::Put, "http://x/orders/7".to_string()),
                (HttpMethod::Delete, "http://x/orders/7".to_string()),
            ]
        );
        assert_eq!(transport.requests()[1].payload, Some(json!({"qty": 1})));
    }

    #[tokio::test]
    async fn test_custom_method_overrides_standard() {
        let transport = Arc::new(RecordingTransport::new());
        let ctx = context(transport.clone());
        let spec = ServiceSpec::new("orders")
            .method("get", |_call| async {
                Ok::<_, PapiError>(Response::new(299, "custom"))
            })
            .method("archive", |call: ServiceCall| {
                let url = format!("{}/archive", call.url());
                call.send_to(HttpMethod::Post, url)
            });
        let node = ServiceNode::build(spec, ctx.base(), &ctx).unwrap();

        let response = node.get(CallArgs::new()).await.unwrap();
        assert_eq!(response.status, 299);
        assert_eq!(transport.call_count(), 0);

        node.call("archive", CallArgs::new().id("3")).await.unwrap();
        assert_eq!(transport.requests()[0].url, "http://x/orders/3/archive");
        assert_eq!(
            node.method_names().map(|m| m.as_str()).collect::<Vec<_>>(),
            ["get", "create", "update", "delete", "archive"]
        );
    }

    #[tokio::test]
    async fn test_unknown_method_is_rejected() {
        let node = build("orders").unwrap();
        let err = node.call("archive", CallArgs::new()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownMethod);
    }
}
