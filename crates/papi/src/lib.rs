//! Composable REST client core.
//!
//! A [`Papi`] client exposes named services. Each service maps to a URL
//! sub-path and carries the standard CRUD methods plus any custom methods,
//! and may nest child services. Every outgoing call passes through the
//! [`AuthGate`]; when the gate denies a call, the active `failedAuthSetup`
//! hook runs instead of the transport.
//!
//! ## Architectural Layer
//!
//! **Domain + port definitions.** This crate has no I/O dependencies. Network
//! access lives behind the [`Transport`] trait; the `transport` crate supplies
//! the HTTP implementation.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`hooks`] | Hook names and the override-stack registry |
//! | [`auth`] | Auth callback slot and the per-call gate |
//! | [`service`] | Service specs, nodes, and method dispatch |
//! | [`client`] | The client root |
//! | [`context`] | State shared between the root and its nodes |
//! | [`config`] | Construction input |
//! | [`transport`] | The transport port and request/response types |
//! | [`identifiers`] | Newtype names and call ids |
//! | [`errors`] | Error taxonomy |
//! | [`testing`] | In-memory transport for tests |

pub mod auth;
pub mod client;
pub mod config;
pub mod context;
pub mod errors;
pub mod hooks;
pub mod identifiers;
pub mod service;
pub mod testing;
pub mod transport;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use auth::{auth_fn, AuthFn, AuthGate};
pub use client::Papi;
pub use config::ClientConfig;
pub use context::ClientContext;
pub use errors::{ErrorKind, PapiError};
pub use hooks::{Hook, HookFn, HookRegistry};
pub use identifiers::{CallId, MethodName, ServiceName};
pub use service::{
    method_fn, CallArgs, Endpoint, EndpointSpec, MethodFn, ServiceCall, ServiceNode, ServiceSpec,
};
pub use transport::{HttpMethod, Request, Response, Transport};
