//! Request descriptor handed to mock handlers.

use http::{HeaderMap, Method, Request};
use hyper::body::Bytes;
use url::Url;

/// An intercepted request as seen by a handler.
///
/// Built once per dispatch and dropped when the handler returns.
#[derive(Debug)]
pub struct Call {
    url: Url,
    request: Request<Bytes>,
}

impl Call {
    pub fn new(url: Url, request: Request<Bytes>) -> Self {
        Self { url, request }
    }

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    /// The absolute request URL, with an empty path normalized to `/`.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        self.request.headers()
    }

    pub fn body(&self) -> &Bytes {
        self.request.body()
    }

    /// The raw intercepted request.
    pub fn request(&self) -> &Request<Bytes> {
        &self.request
    }
}
