//! End-to-end dispatch through the router.

use std::io::{Cursor, Read};

use http::{HeaderMap, HeaderName, HeaderValue, Method, Version};
use stackinabox::error::{Error, Registration};
use stackinabox::http::{equal_headers, status, InterceptedRequest};
use stackinabox::observability::capture_logs;
use stackinabox::{OriginMatcher, PathMatcher, Reply, ReplyBody, Router, ServiceNode};

mod common;

use common::{hello_world_basic_service, hello_world_service, route, send, HELLO_MSG, HELLO_ORIGIN};

#[test]
fn test_empty_router_reports_unhandled_url() {
    let router = Router::new();
    let (status, length, body) = send(&router, Method::GET, "http://x/");
    assert_eq!(status, status::ROUTE_NOT_HANDLED);
    assert_eq!(body, "stackinabox: no service to handle URL 'http://x/'");
    assert_eq!(length, Some(body.len() as u64));
}

#[test]
fn test_hello_world_get() {
    let mut router = Router::new();
    router.register_service(HELLO_ORIGIN, hello_world_service()).unwrap();

    let (status, length, body) = send(&router, Method::GET, "https://hello.world/");
    assert_eq!(status, 200);
    assert_eq!(length, Some(12));
    assert_eq!(body, HELLO_MSG);
}

#[test]
fn test_hello_world_head_headers() {
    let mut router = Router::new();
    router.register_service(HELLO_ORIGIN, hello_world_service()).unwrap();

    let response = router
        .intercept(common::request(Method::HEAD, "https://hello.world"))
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.version(), Version::HTTP_11);

    let mut expected = HeaderMap::new();
    expected.insert(
        HeaderName::from_static("x-msg"),
        HeaderValue::from_static(HELLO_MSG),
    );
    assert_eq!(equal_headers(response.headers(), &expected), Ok(()));
    assert_eq!(response.body().content_length(), None);
    assert!(response.body().trailers().is_none());
}

#[test]
fn test_basic_service_answers_any_verb() {
    let mut router = Router::new();
    router.register(hello_world_basic_service()).unwrap();

    for method in [Method::GET, Method::POST, Method::from_bytes(b"PURGE").unwrap()] {
        let (status, _, body) = send(&router, method, "https://hello.world/anything");
        assert_eq!(status, 200);
        assert_eq!(body, HELLO_MSG);
    }
}

#[test]
fn test_handler_error_becomes_service_error_reply() {
    let mut node = ServiceNode::new("boom", OriginMatcher::new("boom.test").with_protocol("http"));
    node.register_method_handler(Method::GET, |_| Err("boom".into()))
        .unwrap();
    let mut router = Router::new();
    router.register(node).unwrap();

    let (status, _, body) = send(&router, Method::GET, "http://boom.test/");
    assert_eq!(status, status::SERVICE_ERROR);
    assert_eq!(
        body,
        "stackinabox: service handling request had an error - boom"
    );
}

#[test]
fn test_unsupported_verb_names_method_and_url() {
    let mut router = Router::new();
    router.register_service(HELLO_ORIGIN, hello_world_service()).unwrap();

    let (status, _, body) = send(&router, Method::POST, "https://hello.world/greet");
    assert_eq!(status, status::METHOD_NOT_SUPPORTED);
    assert_eq!(body, "POST on https://hello.world/greet is unhandled");
}

#[test]
fn test_duplicate_registration_keeps_first() {
    let mut router = Router::new();
    router.register_service("k1", hello_world_service()).unwrap();
    router.register_service("k2", hello_world_basic_service()).unwrap();

    let err = router.register_service("k1", hello_world_basic_service()).unwrap_err();
    assert!(matches!(err, Error::Duplicate { kind: Registration::Service, ref name } if name == "k1"));
    assert_eq!(router.len(), 2);
    assert_eq!(router.service("k1").unwrap().name(), "helloWorld");
}

#[test]
fn test_first_registered_origin_wins() {
    let mut router = Router::new();
    router.register_service("first", hello_world_service()).unwrap();
    router.register_service("second", hello_world_basic_service()).unwrap();

    let (status, _, _) = send(&router, Method::POST, "https://hello.world/");
    assert_eq!(status, status::METHOD_NOT_SUPPORTED);
}

#[test]
fn test_alias_equivalence_across_schemes() {
    let mut router = Router::new();
    let mut node = ServiceNode::new(
        "plain",
        OriginMatcher::new("alias.test").with_protocol("http").with_port(80),
    );
    node.set_fallback_handler(|call| Ok(Reply::text(200, call.url().scheme())));
    router.register(node).unwrap();

    let mut other = ServiceNode::new(
        "custom",
        OriginMatcher::new("custom.test").with_protocol("http").with_port(8080),
    );
    other.set_fallback_handler(|_| Ok(Reply::text(200, "custom")));
    router.register(other).unwrap();

    assert_eq!(send(&router, Method::GET, "http://alias.test/").2, "http");
    assert_eq!(send(&router, Method::GET, "https://alias.test/").2, "https");
    assert_eq!(send(&router, Method::GET, "https://alias.test:443/").2, "https");
    assert_eq!(send(&router, Method::GET, "http://custom.test:8080/").2, "custom");
    assert_eq!(
        send(&router, Method::GET, "https://custom.test/").0,
        status::ROUTE_NOT_HANDLED
    );
}

#[test]
fn test_nested_routes_dispatch_to_deepest_match() {
    let mut users = route("users", "^/users", "all users");
    users.register_handler(route("admins", "^/users/admins", "admins")).unwrap();

    let mut root = hello_world_service();
    root.register_handler(users).unwrap();
    root.register_handler(route("status", "^/status", "ok")).unwrap();

    let mut router = Router::new();
    router.register(root).unwrap();

    assert_eq!(send(&router, Method::GET, "https://hello.world/").2, HELLO_MSG);
    assert_eq!(send(&router, Method::GET, "https://hello.world/users/7").2, "all users");
    assert_eq!(send(&router, Method::GET, "https://hello.world/users/admins/1").2, "admins");
    assert_eq!(send(&router, Method::GET, "https://hello.world/status").2, "ok");

    let (status, _, body) = send(&router, Method::DELETE, "https://hello.world/users/admins");
    assert_eq!(status, status::METHOD_NOT_SUPPORTED);
    assert!(body.starts_with("DELETE on "));
}

#[test]
fn test_children_match_decoded_paths() {
    let mut root = hello_world_basic_service();
    root.register_handler(route("cafe", "^/café", "child")).unwrap();
    root.register_handler(route("spaced", "^/a b", "spaced")).unwrap();
    let mut router = Router::new();
    router.register(root).unwrap();

    assert_eq!(
        send(&router, Method::GET, "https://hello.world/caf%C3%A9"),
        (200, Some(5), "child".to_string())
    );
    assert_eq!(send(&router, Method::GET, "https://hello.world/a%20b/c").2, "spaced");
    assert_eq!(send(&router, Method::GET, "https://hello.world/cafe").2, HELLO_MSG);
}

#[test]
fn test_ipv6_origin() {
    let mut node = ServiceNode::new("local", OriginMatcher::new("::1").with_protocol("http"));
    node.set_fallback_handler(|call| Ok(Reply::text(200, call.url().as_str())));
    let mut router = Router::new();
    router.register(node).unwrap();
    assert!(router.service("http://[::1]").is_some());

    assert_eq!(
        send(&router, Method::GET, "http://[::1]:8080/x").2,
        "http://[::1]:8080/x"
    );
}

#[test]
fn test_sub_service_anchor_rules() {
    let mut root = hello_world_service();
    let leaf = ServiceNode::new("leaf", PathMatcher::new("^foo$").unwrap());
    assert!(matches!(root.register_handler(leaf), Err(Error::InvalidService(_))));

    let open = ServiceNode::new("open", PathMatcher::new("^foo").unwrap());
    root.register_handler(open).unwrap();

    let dup = ServiceNode::new("open", PathMatcher::new("^bar").unwrap());
    assert!(matches!(
        root.register_handler(dup),
        Err(Error::Duplicate { kind: Registration::SubService, .. })
    ));
    assert_eq!(root.children().count(), 1);
}

#[test]
fn test_misconfigured_child_aborts_intercept() {
    let mut root = hello_world_service();
    root.register_handler(route("ok", "^/ok", "ok")).unwrap();
    let mut router = Router::new();
    router.register_service(HELLO_ORIGIN, root).unwrap();

    let broken = ServiceNode::new("broken", OriginMatcher::new(""));
    router.register_service("broken", broken).unwrap();

    // hello.world is registered first, so the broken matcher is never consulted
    assert_eq!(send(&router, Method::GET, "https://hello.world/ok").2, "ok");

    let err = router
        .intercept(common::request(Method::GET, "https://elsewhere.test/"))
        .unwrap_err();
    assert!(matches!(err, Error::Dispatch { ref service, .. } if service == "broken"));
    assert!(matches!(err.root_cause(), Error::Config(_)));
}

#[test]
fn test_reply_headers_trailers_and_stream() {
    let mut node = ServiceNode::new("stream", OriginMatcher::new("stream.test"));
    node.set_fallback_handler(|call| {
        let data = format!("{} {}", call.method(), call.url().path());
        Ok(Reply::new(201)
            .with_stream(ReplyBody::from_reader(Cursor::new(data.into_bytes())))
            .with_length(99)
            .with_header(HeaderName::from_static("x-a"), HeaderValue::from_static("1"))
            .with_header(HeaderName::from_static("x-a"), HeaderValue::from_static("2"))
            .with_trailer(HeaderName::from_static("x-checksum"), HeaderValue::from_static("abc")))
    });
    let mut router = Router::new();
    router.register(node).unwrap();

    let response = router
        .intercept(common::request(Method::PATCH, "http://stream.test/items/3?x=1"))
        .unwrap();
    assert_eq!(response.status(), 201);

    let values: Vec<_> = response.headers().get_all("x-a").iter().collect();
    assert_eq!(values, vec!["1", "2"]);

    let intercepted = response.extensions().get::<InterceptedRequest>().unwrap();
    assert_eq!(intercepted.method, Method::PATCH);
    assert_eq!(intercepted.uri, "http://stream.test/items/3?x=1");

    let mut body = response.into_body();
    assert_eq!(body.content_length(), Some(99));
    assert_eq!(body.trailers().unwrap()["x-checksum"], "abc");
    let mut text = String::new();
    body.read_to_string(&mut text).unwrap();
    assert_eq!(text, "PATCH /items/3");
}

#[test]
fn test_dispatch_decisions_are_logged() {
    let (_guard, rx) = capture_logs();

    let mut router = Router::new();
    router.register_service(HELLO_ORIGIN, hello_world_service()).unwrap();
    send(&router, Method::GET, "https://hello.world/");
    send(&router, Method::GET, "http://nobody.test/");

    let logs = rx.contents();
    assert!(logs.contains("Registered service"), "{}", logs);
    assert!(logs.contains("Service handles URL"), "{}", logs);
    assert!(logs.contains("No service to handle URL"), "{}", logs);
}
