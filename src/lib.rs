//! In-process HTTP mock transport.
//!
//! Register mock services keyed by origin, then hand the [`Router`] (or its
//! `tower::Service` form, [`MockTransport`]) to the client under test. Every
//! request is answered by the deepest matching node of a service tree,
//! without touching the network.

pub mod config;
pub mod error;
pub mod http;
pub mod observability;
pub mod routing;
pub mod service;

pub use config::{load_fixture, FixtureConfig};
pub use error::{Error, Registration, Result};
pub use crate::http::{Call, MockTransport, Reply, ReplyBody};
pub use routing::{OriginMatcher, PathMatcher, Router, UriMatcher};
pub use service::{handler_fn, Handler, ServiceNode};
