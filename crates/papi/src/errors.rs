//! Error types for the papi client core.
//!
//! [`PapiError`] covers every contract violation raised by registration,
//! construction, and gated calls. All of them are raised synchronously at the
//! offending call; nothing is deferred or retried internally.
//!
//! [`ErrorKind`] is the stable identity of an error. Match on it when the
//! human-readable message is not needed.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Stable identity
// ---------------------------------------------------------------------------

/// Stable, payload-free identity of a [`PapiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A name or callback passed to a registration call was malformed.
    InvalidArgument,
    /// The hook name is not part of the recognised set.
    UnknownHook,
    /// A hook was deregistered more times than it was registered.
    NoHistory,
    /// No configuration was supplied at construction.
    MissingConfig,
    /// The configuration had no base URL.
    MissingBaseUrl,
    /// A service spec had no name.
    MissingServiceName,
    /// A service name collided within one registration scope.
    DuplicateService,
    /// The default `failedAuthSetup` hook fired.
    AuthSetupFailed,
    /// A service was asked for a method it does not carry.
    UnknownMethod,
    /// The transport collaborator failed to complete a request.
    Transport,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by the client root, service nodes, hook registry, and auth gate.
#[derive(Debug, Clone, Error)]
pub enum PapiError {
    /// A malformed name or callback was passed to a registration call.
    #[error("{message}")]
    InvalidArgument {
        /// Description of what was wrong with the argument.
        message: String,
    },

    /// The hook name is not one of the recognised hooks.
    #[error("Papi couldn't find a hook with the name of {name}.")]
    UnknownHook {
        /// The name that failed to resolve.
        name: String,
    },

    /// `deregister` was called with nothing left to restore.
    #[error("Papi tried to deregister the hook {hook} but there is no previous implementation to restore.")]
    NoHistory {
        /// Wire name of the hook.
        hook: String,
    },

    /// The client was constructed without any configuration.
    #[error("Missing API configuration.")]
    MissingConfig,

    /// The configuration did not carry a base URL.
    #[error("Missing API Base URL.")]
    MissingBaseUrl,

    /// A service spec did not carry a name.
    #[error("Missing service name.")]
    MissingServiceName,

    /// A service with this name already exists under the same parent.
    #[error("Service {name} is already registered.")]
    DuplicateService {
        /// The colliding service name.
        name: String,
    },

    /// Produced by the default `failedAuthSetup` hook.
    #[error("Papi wasn't able to setup authentication for the requested call.")]
    AuthSetupFailed,

    /// The method is not present on the service.
    #[error("Service {service} has no method named {method}.")]
    UnknownMethod {
        /// Name of the service that was called.
        service: String,
        /// The method that was requested.
        method: String,
    },

    /// The transport collaborator reported a failure.
    #[error("Transport error: {message}")]
    Transport {
        /// Description supplied by the transport.
        message: String,
    },
}

impl PapiError {
    /// Builds an [`PapiError::InvalidArgument`] with the given message.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Returns the stable identity of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::UnknownHook { .. } => ErrorKind::UnknownHook,
            Self::NoHistory { .. } => ErrorKind::NoHistory,
            Self::MissingConfig => ErrorKind::MissingConfig,
            Self::MissingBaseUrl => ErrorKind::MissingBaseUrl,
            Self::MissingServiceName => ErrorKind::MissingServiceName,
            Self::DuplicateService { .. } => ErrorKind::DuplicateService,
            Self::AuthSetupFailed => ErrorKind::AuthSetupFailed,
            Self::UnknownMethod { .. } => ErrorKind::UnknownMethod,
            Self::Transport { .. } => ErrorKind::Transport,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_stable() {
        assert_eq!(PapiError::MissingConfig.to_string(), "Missing API configuration.");
        assert_eq!(PapiError::MissingBaseUrl.to_string(), "Missing API Base URL.");
        assert_eq!(
            PapiError::AuthSetupFailed.to_string(),
            "Papi wasn't able to setup authentication for the requested call."
        );
        assert_eq!(
            PapiError::UnknownHook {
                name: "badHook".into()
            }
            .to_string(),
            "Papi couldn't find a hook with the name of badHook."
        );
    }

    #[test]
    fn test_kind_matches_variant() {
        let err = PapiError::DuplicateService {
            name: "orders".into(),
        };
        assert_eq!(err.kind(), ErrorKind::DuplicateService);
        assert_eq!(
            PapiError::invalid_argument("bad").kind(),
            ErrorKind::InvalidArgument
        );
    }
}
