//! Shared services and request helpers for integration tests.

#![allow(dead_code)]

use http::{HeaderName, HeaderValue, Method, Request, Response};
use hyper::body::Bytes;
use stackinabox::{OriginMatcher, PathMatcher, Reply, ReplyBody, Router, ServiceNode};

pub const HELLO_ORIGIN: &str = "https://hello.world";
pub const HELLO_MSG: &str = "hello world!";

/// A service answering GET with a body and HEAD with an `x-msg` header.
pub fn hello_world_service() -> ServiceNode {
    let mut node = ServiceNode::new(
        "helloWorld",
        OriginMatcher::new("hello.world").with_protocol("https"),
    );
    node.register_method_handler(Method::GET, |_| Ok(Reply::text(200, HELLO_MSG)))
        .unwrap();
    node.register_method_handler(Method::HEAD, |_| {
        Ok(Reply::new(200).with_header(
            HeaderName::from_static("x-msg"),
            HeaderValue::from_static(HELLO_MSG),
        ))
    })
    .unwrap();
    node
}

/// A service answering every verb through its fallback.
pub fn hello_world_basic_service() -> ServiceNode {
    let mut node = ServiceNode::new(
        "helloWorldBasic",
        OriginMatcher::new("hello.world").with_protocol("https"),
    );
    node.set_fallback_handler(|_| Ok(Reply::text(200, HELLO_MSG)));
    node
}

/// A sub-service named `name` on `pattern` answering GET with `body`.
pub fn route(name: &str, pattern: &str, body: &'static str) -> ServiceNode {
    let mut node = ServiceNode::new(name, PathMatcher::new(pattern).unwrap());
    node.register_method_handler(Method::GET, move |_| Ok(Reply::text(200, body)))
        .unwrap();
    node
}

pub fn request(method: Method, url: &str) -> Request<Bytes> {
    Request::builder()
        .method(method)
        .uri(url)
        .body(Bytes::new())
        .unwrap()
}

/// Intercept and split the response into status, length and body text.
pub fn send(router: &Router, method: Method, url: &str) -> (u16, Option<u64>, String) {
    let response = router.intercept(request(method, url)).unwrap();
    split(response)
}

pub fn split(response: Response<ReplyBody>) -> (u16, Option<u64>, String) {
    let status = response.status().as_u16();
    let body = response.into_body();
    let length = body.content_length();
    (status, length, body.into_string().unwrap())
}
