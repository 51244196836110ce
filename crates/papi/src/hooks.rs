//! Hook override stack.
//!
//! A hook is a named extension point with exactly one active implementation.
//! [`HookRegistry::register`] pushes the active implementation onto a per-hook
//! history stack before installing the new one; [`HookRegistry::deregister`]
//! pops it back. Nested overrides therefore unwind in strict reverse order.
//!
//! The set of hooks is closed: see [`Hook`].

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{PapiError, Response};

/// An installed hook implementation.
///
/// The `failedAuthSetup` hook receives no arguments. Returning `Ok` substitutes
/// a response for the denied call; returning `Err` fails it.
pub type HookFn = Arc<dyn Fn() -> Result<Response, PapiError> + Send + Sync>;

// ---------------------------------------------------------------------------
// Hook names
// ---------------------------------------------------------------------------

/// The recognised hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hook {
    /// Fired by the auth gate when the auth callback denies a call.
    #[serde(rename = "failedAuthSetup")]
    FailedAuthSetup,
}

impl Hook {
    /// Every recognised hook.
    pub const ALL: [Hook; 1] = [Hook::FailedAuthSetup];

    /// Returns the name used to address the hook in registration calls.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FailedAuthSetup => "failedAuthSetup",
        }
    }
}

impl std::fmt::Display for Hook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Hook {
    type Err = PapiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|hook| hook.as_str() == s)
            .ok_or_else(|| PapiError::UnknownHook { name: s.to_string() })
    }
}

/// The implementation installed for `failedAuthSetup` before any override.
pub fn default_failed_auth_setup() -> HookFn {
    Arc::new(|| Err(PapiError::AuthSetupFailed))
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

struct Slot {
    active: HookFn,
    history: Vec<HookFn>,
}

impl Slot {
    fn new(active: HookFn) -> Self {
        Self {
            active,
            history: Vec::new(),
        }
    }
}

/// Owns the active implementation and override history of every hook.
pub struct HookRegistry {
    failed_auth_setup: Slot,
}

impl HookRegistry {
    /// Creates a registry with every hook at its default implementation.
    pub fn new() -> Self {
        Self {
            failed_auth_setup: Slot::new(default_failed_auth_setup()),
        }
    }

    fn slot(&self, hook: Hook) -> &Slot {
        match hook {
            Hook::FailedAuthSetup => &self.failed_auth_setup,
        }
    }

    fn slot_mut(&mut self, hook: Hook) -> &mut Slot {
        match hook {
            Hook::FailedAuthSetup => &mut self.failed_auth_setup,
        }
    }

    /// Installs `callback` as the active implementation of `name`, keeping the
    /// previous one on the history stack.
    ///
    /// # Errors
    ///
    /// - [`PapiError::InvalidArgument`] if `name` is empty.
    /// - [`PapiError::UnknownHook`] if `name` is not a recognised hook.
    pub fn register(&mut self, name: &str, callback: HookFn) -> Result<(), PapiError> {
        if name.is_empty() {
            return Err(PapiError::invalid_argument(
                "Papi tried to register a new hook but is missing the hook name.",
            ));
        }
        let hook: Hook = name.parse()?;

        let slot = self.slot_mut(hook);
        let previous = std::mem::replace(&mut slot.active, callback);
        slot.history.push(previous);

        debug!(hook = %hook, depth = slot.history.len(), "Registered hook override");
        Ok(())
    }

    /// Restores the implementation that was active before the most recent
    /// [`register`](Self::register) of `name`.
    ///
    /// # Errors
    ///
    /// - [`PapiError::InvalidArgument`] if `name` is empty.
    /// - [`PapiError::UnknownHook`] if `name` is not a recognised hook.
    /// - [`PapiError::NoHistory`] if there is no override left to undo.
    pub fn deregister(&mut self, name: &str) -> Result<(), PapiError> {
        if name.is_empty() {
            return Err(PapiError::invalid_argument(
                "Papi tried to deregister a hook but is missing the hook name.",
            ));
        }
        let hook: Hook = name.parse()?;

        let slot = self.slot_mut(hook);
        let previous = slot.history.pop().ok_or_else(|| PapiError::NoHistory {
            hook: hook.to_string(),
        })?;
        slot.active = previous;

        debug!(hook = %hook, depth = slot.history.len(), "Restored previous hook");
        Ok(())
    }

    /// Returns the active implementation of `hook`.
    pub fn active(&self, hook: Hook) -> HookFn {
        Arc::clone(&self.slot(hook).active)
    }

    /// Returns the number of overrides of `hook` not yet deregistered.
    pub fn depth(&self, hook: Hook) -> usize {
        self.slot(hook).history.len()
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for hook in Hook::ALL {
            map.entry(&hook.as_str(), &self.depth(hook));
        }
        map.finish()
    }
}
