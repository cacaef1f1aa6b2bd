//! Mock service tree.
//!
//! # Data Flow
//! ```text
//! Root ServiceNode (origin matcher)
//!     → node.rs (children checked first, path matchers)
//!     → deepest matching node wins
//!     → handler.rs (verb map, or fallback)
//!     → Reply
//! ```
//!
//! # Design Decisions
//! - Each node owns its children; no back references
//! - Child names are unique per parent
//! - A node with verb handlers answers unknown verbs with 405
//! - A node with no verb handlers answers through its fallback

pub mod handler;
pub mod node;

pub use handler::{handler_fn, Handler, ResolvedHandler};
pub use node::{validate_pattern, ServiceNode};
