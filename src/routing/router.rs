//! Origin registry and request interception.
//!
//! # Responsibilities
//! - Store root services keyed by origin
//! - Find the service whose origin matches an intercepted request
//! - Run the resolved handler and turn its reply into a response
//! - Answer unmatched requests and failing handlers with reserved statuses
//!
//! # Design Decisions
//! - Registry is a flat list scanned in registration order; first match wins
//! - Re-registration is an error, never an overwrite
//! - Matcher errors abort the request; handler errors become 596 replies
//! - Registration takes `&mut self`; share the router through `Arc` to serve

use std::sync::Arc;

use http::{Request, Response, Version};
use hyper::body::Bytes;
use url::Url;

use crate::error::{Error, Registration, Result};
use crate::http::call::Call;
use crate::http::reply::{Reply, ReplyBody};
use crate::http::response::ResponseBuilder;
use crate::http::status;
use crate::http::transport::MockTransport;
use crate::service::ServiceNode;

/// Derive the `scheme://host[:port]` origin key of a URL.
///
/// The port is included only when it differs from the scheme default.
pub fn origin_key(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    }
}

/// Build the absolute URL of an intercepted request.
fn request_url(request: &Request<Bytes>) -> Result<Url> {
    let uri = request.uri();
    if uri.scheme().is_none() || uri.authority().is_none() {
        tracing::warn!(uri = %uri, "Request has no absolute URL");
        return Err(Error::InvalidRequest(format!(
            "request target {:?} is not an absolute URL",
            uri.to_string()
        )));
    }

    let mut url = Url::parse(&uri.to_string())
        .map_err(|e| Error::InvalidRequest(format!("request URL {:?}: {}", uri.to_string(), e)))?;
    if url.path().is_empty() {
        url.set_path("/");
    }
    Ok(url)
}

/// The mock transport: a registry of services answering intercepted requests.
#[derive(Debug, Default)]
pub struct Router {
    services: Vec<(String, ServiceNode)>,
    responses: ResponseBuilder,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the protocol version stamped on every response (default HTTP/1.1).
    pub fn with_version(mut self, version: Version) -> Self {
        self.responses = ResponseBuilder::new(version);
        self
    }

    pub fn version(&self) -> Version {
        self.responses.version()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn service(&self, key: &str) -> Option<&ServiceNode> {
        self.services
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, node)| node)
    }

    /// Registered services in registration order.
    pub fn services(&self) -> impl Iterator<Item = (&str, &ServiceNode)> {
        self.services.iter().map(|(k, node)| (k.as_str(), node))
    }

    /// Register `node` under `key`.
    pub fn register_service(&mut self, key: impl Into<String>, node: ServiceNode) -> Result<()> {
        let key = key.into();
        if self.service(&key).is_some() {
            tracing::warn!(service = %key, "Service already registered");
            return Err(Error::duplicate(Registration::Service, key));
        }

        tracing::info!(service = %key, name = %node.name(), "Registered service");
        self.services.push((key, node));
        Ok(())
    }

    /// Register a root service under the key derived from its origin matcher.
    pub fn register(&mut self, node: ServiceNode) -> Result<()> {
        let key = match node.matcher().as_origin() {
            Some(origin) => origin.origin_key(),
            None => {
                return Err(Error::InvalidService(format!(
                    "{} has no origin matcher to derive a service key from",
                    node.name()
                )))
            }
        };
        self.register_service(key, node)
    }

    /// Build the response for `reply` answering `request`.
    pub fn build_response<B>(&self, reply: Reply, request: &Request<B>) -> Result<Response<ReplyBody>> {
        self.responses.build(reply, request)
    }

    /// Answer an outbound request without touching the network.
    ///
    /// Returns an error only for structural problems: a request without an
    /// absolute URL, a misconfigured matcher, or a reply that cannot become
    /// a response. Everything else is a response, using the reserved
    /// statuses from [`status`] when no service answers normally.
    pub fn intercept<B>(&self, request: Request<B>) -> Result<Response<ReplyBody>>
    where
        B: Into<Bytes>,
    {
        let request = request.map(Into::into);
        let url = request_url(&request)?;
        tracing::debug!(method = %request.method(), url = %url, "Request intercepted");

        let mut resolved = None;
        for (key, node) in &self.services {
            let matched = node.matcher().is_match(&url).map_err(|e| {
                tracing::error!(service = %key, error = %e, "Service matcher failed, fix the fixture");
                Error::dispatch(key.clone(), e)
            })?;
            if matched {
                tracing::debug!(service = %key, url = %url, "Service handles URL");
                resolved = Some((key, node.get_handler(&url)?));
                break;
            }
        }

        let Some((key, handler)) = resolved else {
            tracing::warn!(method = %request.method(), url = %url, "No service to handle URL");
            let msg = format!("stackinabox: no service to handle URL '{}'", url);
            return self
                .responses
                .build(Reply::text(status::ROUTE_NOT_HANDLED, msg), &request);
        };

        let call = Call::new(url, request);
        match handler.call(&call) {
            Ok(reply) => {
                tracing::debug!(service = %key, node = %handler.node().name(), status = reply.status, "Service replied");
                self.responses.build(reply, call.request())
            }
            Err(err) => {
                tracing::warn!(service = %key, node = %handler.node().name(), error = %err, "Service handler failed");
                let msg = format!(
                    "stackinabox: service handling request had an error - {}",
                    err
                );
                self.responses
                    .build(Reply::text(status::SERVICE_ERROR, msg), call.request())
            }
        }
    }

    /// Freeze the router into a `tower::Service`.
    pub fn into_transport(self) -> MockTransport {
        MockTransport::new(Arc::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::matcher::{OriginMatcher, PathMatcher};
    use http::{Method, StatusCode};

    fn hello_service() -> ServiceNode {
        let mut node = ServiceNode::new(
            "helloWorld",
            OriginMatcher::new("hello.world").with_protocol("https"),
        );
        node.register_method_handler(Method::GET, |_| Ok(Reply::text(200, "hello world!")))
            .unwrap();
        node
    }

    fn get(url: &str) -> Request<Bytes> {
        Request::builder().uri(url).body(Bytes::new()).unwrap()
    }

    #[test]
    fn test_new_router() {
        let router = Router::new();
        assert!(router.is_empty());
        assert_eq!(router.version(), Version::HTTP_11);
    }

    #[test]
    fn test_register_service_rejects_duplicate() {
        let mut router = Router::new();
        router.register_service("k1", hello_service()).unwrap();
        router.register_service("k2", hello_service()).unwrap();

        let err = router.register_service("k1", hello_service()).unwrap_err();
        assert!(matches!(
            err,
            Error::Duplicate { kind: Registration::Service, .. }
        ));
        assert_eq!(router.services().filter(|(k, _)| *k == "k1").count(), 1);
        assert_eq!(router.len(), 2);
    }

    #[test]
    fn test_register_derives_origin_key() {
        let mut router = Router::new();
        router.register(hello_service()).unwrap();
        assert!(router.service("https://hello.world").is_some());

        let sub = ServiceNode::new("sub", PathMatcher::new("^/a").unwrap());
        assert!(matches!(router.register(sub), Err(Error::InvalidService(_))));
    }

    #[test]
    fn test_intercept_without_services() {
        let router = Router::new();
        let response = router.intercept(get("http://x/")).unwrap();
        assert_eq!(response.status().as_u16(), status::ROUTE_NOT_HANDLED);
        let body = response.into_body().into_string().unwrap();
        assert_eq!(body, "stackinabox: no service to handle URL 'http://x/'");
    }

    #[test]
    fn test_intercept_hello_world() {
        let mut router = Router::new();
        router.register_service("https://hello.world", hello_service()).unwrap();

        let response = router.intercept(get("https://hello.world/")).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body();
        assert_eq!(body.content_length(), Some(12));
        assert_eq!(body.into_string().unwrap(), "hello world!");
    }

    #[test]
    fn test_intercept_handler_error_becomes_reply() {
        let mut node = ServiceNode::new("boom", OriginMatcher::new("boom.test"));
        node.register_method_handler(Method::GET, |_| Err("boom".into()))
            .unwrap();
        let mut router = Router::new();
        router.register(node).unwrap();

        let response = router.intercept(get("http://boom.test/")).unwrap();
        assert_eq!(response.status().as_u16(), status::SERVICE_ERROR);
        let body = response.into_body().into_string().unwrap();
        assert!(body.contains("boom"), "body: {}", body);
    }

    #[test]
    fn test_intercept_unsupported_method() {
        let mut router = Router::new();
        router.register(hello_service()).unwrap();

        let request = Request::builder()
            .method(Method::POST)
            .uri("https://hello.world/")
            .body(Bytes::new())
            .unwrap();
        let response = router.intercept(request).unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        let body = response.into_body().into_string().unwrap();
        assert!(body.contains("POST"));
        assert!(body.contains("https://hello.world/"));
    }

    #[test]
    fn test_intercept_rejects_relative_request() {
        let router = Router::new();
        let result = router.intercept(get("/relative"));
        assert!(matches!(result, Err(Error::InvalidRequest(_))));
    }

    #[test]
    fn test_intercept_matcher_error_aborts() {
        let mut router = Router::new();
        router
            .register_service("broken", ServiceNode::new("broken", OriginMatcher::new("")))
            .unwrap();
        router.register(hello_service()).unwrap();

        let err = router.intercept(get("https://hello.world/")).unwrap_err();
        assert!(matches!(err, Error::Dispatch { ref service, .. } if service == "broken"));
        assert!(matches!(err.root_cause(), Error::Config(_)));
    }

    #[test]
    fn test_intercept_invalid_reply_status() {
        let mut node = ServiceNode::new("bad", OriginMatcher::new("bad.test"));
        node.set_fallback_handler(|_| Ok(Reply::new(42)));
        let mut router = Router::new();
        router.register(node).unwrap();

        let result = router.intercept(get("http://bad.test/"));
        assert!(matches!(result, Err(Error::ResponseBuild(_))));
    }

    #[test]
    fn test_intercept_accepts_any_body_type() {
        let mut node = ServiceNode::new("echo", OriginMatcher::new("echo.test"));
        node.register_method_handler(Method::PUT, |call| {
            Ok(Reply::new(200).with_body(call.body().clone()))
        })
        .unwrap();
        let mut router = Router::new();
        router.register(node).unwrap();

        let request = Request::builder()
            .method(Method::PUT)
            .uri("http://echo.test/data")
            .body("payload")
            .unwrap();
        let response = router.intercept(request).unwrap();
        assert_eq!(response.into_body().into_string().unwrap(), "payload");
    }

    #[test]
    fn test_version_is_configurable() {
        let mut router = Router::new().with_version(Version::HTTP_10);
        router.register(hello_service()).unwrap();
        let response = router.intercept(get("https://hello.world/")).unwrap();
        assert_eq!(response.version(), Version::HTTP_10);
    }

    #[test]
    fn test_origin_key() {
        let url = Url::parse("https://hello.world:8443/path?q=1").unwrap();
        assert_eq!(origin_key(&url), "https://hello.world:8443");
        let url = Url::parse("https://hello.world:443/path").unwrap();
        assert_eq!(origin_key(&url), "https://hello.world");
    }
}
