//! Error definitions shared by the matchers, service tree and router.

use std::fmt;

use thiserror::Error;

/// What a rejected registration collided with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// An origin key in the router registry.
    Service,
    /// A named child of a service node.
    SubService,
    /// A verb handler on a service node.
    Method,
}

impl fmt::Display for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Registration::Service => f.write_str("service"),
            Registration::SubService => f.write_str("sub-service"),
            Registration::Method => f.write_str("method"),
        }
    }
}

/// Errors raised while registering or dispatching mock services.
#[derive(Debug, Error)]
pub enum Error {
    /// A matcher is missing required configuration.
    #[error("misconfigured matcher: {0}")]
    Config(String),

    /// The intercepted request cannot be dispatched.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The name, key or verb is already registered.
    #[error("{kind} {name} already registered")]
    Duplicate { kind: Registration, name: String },

    /// The service cannot be registered where it was offered.
    #[error("invalid service: {0}")]
    InvalidService(String),

    /// A matcher failed while a request was being routed.
    #[error("service {service} generated an error: {source}")]
    Dispatch {
        service: String,
        #[source]
        source: Box<Error>,
    },

    /// A reply could not be turned into a response.
    #[error("internal error while building response: {0}")]
    ResponseBuild(String),
}

impl Error {
    pub(crate) fn duplicate(kind: Registration, name: impl Into<String>) -> Self {
        Error::Duplicate {
            kind,
            name: name.into(),
        }
    }

    pub(crate) fn dispatch(service: impl Into<String>, source: Error) -> Self {
        Error::Dispatch {
            service: service.into(),
            source: Box::new(source),
        }
    }

    /// Returns the innermost error, looking through dispatch wrappers.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Dispatch { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Result type for registration and dispatch.
pub type Result<T, E = Error> = std::result::Result<T, E>;
