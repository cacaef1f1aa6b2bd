//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Intercepted Request (method, absolute URL, headers, body)
//!     → router.rs (scan registered origins in order)
//!     → matcher.rs (origin match on scheme, host, port)
//!     → service tree (path match on nested sub-services)
//!     → Return: handler reply, or reserved-status reply
//! ```
//!
//! # Design Decisions
//! - Origins registered up front; the router is read-only while serving
//! - Deterministic: same registry and URL always resolve the same handler
//! - First registered origin wins
//! - Path patterns are regexes, anchored at the start

pub mod matcher;
pub mod router;

pub use matcher::{OriginMatcher, PathMatcher, UriMatcher};
pub use router::{origin_key, Router};
