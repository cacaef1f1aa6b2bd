//! `tower::Service` adapter over a frozen [`Router`].
//!
//! Clients written against `tower::Service<Request<B>>` take a
//! [`MockTransport`] in place of a real connector. Every call is answered
//! synchronously, so the returned future is always ready.

use std::future::{ready, Ready};
use std::sync::Arc;
use std::task::{Context, Poll};

use http::{Request, Response};
use hyper::body::Bytes;

use crate::error::{Error, Result};
use crate::http::reply::ReplyBody;
use crate::routing::router::Router;

/// A cloneable transport answering requests from a shared router.
#[derive(Debug, Clone)]
pub struct MockTransport {
    router: Arc<Router>,
}

impl MockTransport {
    pub fn new(router: Arc<Router>) -> Self {
        Self { router }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }
}

impl From<Router> for MockTransport {
    fn from(router: Router) -> Self {
        Self::new(Arc::new(router))
    }
}

impl<B> tower::Service<Request<B>> for MockTransport
where
    B: Into<Bytes>,
{
    type Response = Response<ReplyBody>;
    type Error = Error;
    type Future = Ready<Result<Self::Response>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<B>) -> Self::Future {
        ready(self.router.intercept(request))
    }
}
