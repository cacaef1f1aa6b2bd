//! Handler types and the handler resolved for a request.

use std::sync::Arc;

use tower::BoxError;

use crate::http::call::Call;
use crate::http::reply::Reply;
use crate::http::status;
use crate::service::node::ServiceNode;

/// A mock handler. Application errors become 596 replies at the router.
pub type Handler = Arc<dyn Fn(&Call) -> Result<Reply, BoxError> + Send + Sync>;

/// Wrap a closure as a [`Handler`].
pub fn handler_fn<F>(f: F) -> Handler
where
    F: Fn(&Call) -> Result<Reply, BoxError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Fallback of a node with no verb handlers and no matching child.
pub(crate) fn unhandled() -> Handler {
    handler_fn(|_call| Ok(Reply::text(status::UNHANDLED, "Unhandled")))
}

/// The handler chosen for a URL by [`ServiceNode::get_handler`].
#[derive(Debug, Clone, Copy)]
pub enum ResolvedHandler<'a> {
    /// Dispatch on the call's method through the node's verb map.
    Methods(&'a ServiceNode),
    /// The node's fallback handler.
    Fallback(&'a ServiceNode),
}

impl<'a> ResolvedHandler<'a> {
    /// The node that will answer the call.
    pub fn node(&self) -> &'a ServiceNode {
        match self {
            ResolvedHandler::Methods(node) | ResolvedHandler::Fallback(node) => node,
        }
    }

    pub fn call(&self, call: &Call) -> Result<Reply, BoxError> {
        match self {
            ResolvedHandler::Methods(node) => node.dispatch_method(call),
            ResolvedHandler::Fallback(node) => (node.fallback_handler())(call),
        }
    }
}
