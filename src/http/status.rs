//! Status codes reserved by the mock transport.
//!
//! The 59x codes sit outside the registered IANA ranges so a test can tell
//! a synthetic transport reply apart from anything a mock service returns.

/// The URL is handled but the HTTP method is not.
pub const METHOD_NOT_SUPPORTED: u16 = 405;

/// Reply of a node that has neither a matching child nor verb handlers.
pub const UNHANDLED: u16 = 500;

/// No registered service matches the URL.
pub const ROUTE_NOT_HANDLED: u16 = 595;

/// The service handling the request returned an error.
pub const SERVICE_ERROR: u16 = 596;

/// A service handles part of a route but not the whole of it.
///
/// Reserved. Dispatch falls back to the deepest matching node instead of
/// emitting this code.
pub const SUB_ROUTE_NOT_HANDLED: u16 = 597;
