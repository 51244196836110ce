//! Auth gate.
//!
//! A single auth callback decides, once per outgoing call, whether the call may
//! reach the transport. Registering a new callback replaces the old one; there
//! is no history. When the callback denies a call, the gate runs the active
//! `failedAuthSetup` hook instead of the transport and returns whatever the
//! hook returns.

use std::future::Future;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::{ClientContext, Hook, PapiError, Response, ServiceName};

/// An auth callback.
///
/// Receives the client context, the service being called, and the endpoint
/// URL of the call. Returning `false` denies the call.
pub type AuthFn = Arc<dyn Fn(&ClientContext, &ServiceName, &str) -> bool + Send + Sync>;

/// Wraps a closure as an [`AuthFn`].
pub fn auth_fn<F>(f: F) -> AuthFn
where
    F: Fn(&ClientContext, &ServiceName, &str) -> bool + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Holds the active auth callback.
#[derive(Default)]
pub struct AuthGate {
    callback: RwLock<Option<AuthFn>>,
}

impl AuthGate {
    /// Creates a gate with no callback; every call is allowed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the active callback.
    pub fn register(&self, callback: AuthFn) {
        let replaced = self.callback.write().replace(callback).is_some();
        debug!(replaced, "Registered auth callback");
    }

    /// Returns the active callback, if one was registered.
    pub fn callback(&self) -> Option<AuthFn> {
        self.callback.read().clone()
    }

    /// Returns `true` once a callback has been registered.
    pub fn is_configured(&self) -> bool {
        self.callback.read().is_some()
    }

    /// Runs the active callback for one call. Without a callback the call is
    /// allowed unauthenticated.
    pub fn evaluate(&self, client: &ClientContext, service: &ServiceName, endpoint: &str) -> bool {
        // Cloned out so the callback may itself re-register auth.
        match self.callback() {
            Some(callback) => callback(client, service, endpoint),
            None => true,
        }
    }

    /// Runs `proceed` if the call is authorised, otherwise the active
    /// `failedAuthSetup` hook. Exactly one of the two runs.
    pub async fn guard<F, Fut>(
        &self,
        client: &ClientContext,
        service: &ServiceName,
        endpoint: &str,
        proceed: F,
    ) -> Result<Response, PapiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Response, PapiError>>,
    {
        if self.evaluate(client, service, endpoint) {
            return proceed().await;
        }

        warn!(service = %service, endpoint, "Auth callback denied call");
        let hook = client.hooks().read().active(Hook::FailedAuthSetup);
        hook()
    }
}

impl std::fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGate")
            .field("configured", &self.is_configured())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::testing::RecordingTransport;
    use crate::ErrorKind;

    fn context() -> ClientContext {
        ClientContext::new("http://x", Vec::new(), Arc::new(RecordingTransport::new()))
    }

    fn service() -> ServiceName {
        ServiceName::new("widgets").unwrap()
    }

    #[test]
    fn test_evaluate_allows_without_callback() {
        let ctx = context();
        assert!(!ctx.auth().is_configured());
        assert!(ctx.auth().evaluate(&ctx, &service(), "http://x/widgets"));
    }

    #[test]
    fn test_register_replaces_previous_callback() {
        let ctx = context();
        ctx.auth().register(auth_fn(|_, _, _| false));
        ctx.auth().register(auth_fn(|_, _, _| true));
        assert!(ctx.auth().evaluate(&ctx, &service(), "http://x/widgets"));
    }

    #[test]
    fn test_callback_receives_call_context() {
        let ctx = context();
        ctx.auth().register(auth_fn(|client, service, endpoint| {
            client.base() == "http://x"
                && service.as_str() == "widgets"
                && endpoint == "http://x/widgets/1"
        }));
        assert!(ctx.auth().evaluate(&ctx, &service(), "http://x/widgets/1"));
        assert!(!ctx.auth().evaluate(&ctx, &service(), "http://x/widgets/2"));
    }

    #[tokio::test]
    async fn test_guard_runs_proceed_when_allowed() {
        let ctx = context();
        ctx.auth().register(auth_fn(|_, _, _| true));
        let proceeded = AtomicUsize::new(0);

        let response = ctx
            .auth()
            .guard(&ctx, &service(), "http://x/widgets", || async {
                proceeded.fetch_add(1, Ordering::SeqCst);
                Ok::<_, PapiError>(Response::new(200, "ok"))
            })
            .await
            .unwrap();

        assert_eq!(response.body, "ok");
        assert_eq!(proceeded.load(Ordering::SeqCst), 1);
        assert_eq!(ctx.hooks().read().depth(Hook::FailedAuthSetup), 0);
    }

    #[tokio::test]
    async fn test_guard_runs_hook_instead_of_proceed_when_denied() {
        let ctx = context();
        ctx.auth().register(auth_fn(|_, _, _| false));
        let proceeded = AtomicUsize::new(0);

        let err = ctx
            .auth()
            .guard(&ctx, &service(), "http://x/widgets", || async {
                proceeded.fetch_add(1, Ordering::SeqCst);
                Ok::<_, PapiError>(Response::new(200, "ok"))
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::AuthSetupFailed);
        assert_eq!(proceeded.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_guard_returns_hook_substitute() {
        let ctx = context();
        ctx.auth().register(auth_fn(|_, _, _| false));
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        ctx.hooks()
            .write()
            .register(
                "failedAuthSetup",
                Arc::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(Response::new(401, "login required"))
                }),
            )
            .unwrap();

        let response = ctx
            .auth()
            .guard(&ctx, &service(), "http://x/widgets", || async {
                Ok::<_, PapiError>(Response::new(200, "ok"))
            })
            .await
            .unwrap();

        assert_eq!(response.status, 401);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
