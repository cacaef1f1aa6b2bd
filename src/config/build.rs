//! Turn a validated fixture into a router of static handlers.

use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use hyper::body::Bytes;

use crate::config::schema::{FixtureConfig, NodeConfig, OriginConfig, ServiceConfig, StaticReplyConfig};
use crate::config::validation::method_token;
use crate::error::{Error, Result};
use crate::http::reply::Reply;
use crate::routing::matcher::{OriginMatcher, PathMatcher};
use crate::routing::router::Router;
use crate::service::{handler_fn, Handler, ServiceNode};

impl OriginConfig {
    pub fn matcher(&self) -> OriginMatcher {
        let matcher = OriginMatcher::new(self.host.trim()).with_protocol(self.protocol.trim());
        match self.port {
            Some(port) => matcher.with_port(port),
            None => matcher,
        }
    }
}

impl ServiceConfig {
    /// The registry key: the explicit `key`, or the origin key.
    pub fn service_key(&self) -> String {
        self.key
            .clone()
            .unwrap_or_else(|| self.origin.matcher().origin_key())
    }
}

impl StaticReplyConfig {
    /// A handler answering every call with a copy of this reply.
    pub fn handler(&self) -> Result<Handler> {
        let status = StatusCode::from_u16(self.status)
            .map_err(|e| Error::ResponseBuild(format!("status {}: {}", self.status, e)))?
            .as_u16();

        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::ResponseBuild(format!("header name {:?}: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::ResponseBuild(format!("header {}: {}", name, e)))?;
            headers.append(name, value);
        }
        let body = Bytes::from(self.body.clone());

        Ok(handler_fn(move |_call| {
            let mut reply = Reply::new(status).with_body(body.clone());
            reply.headers = headers.clone();
            Ok(reply)
        }))
    }
}

fn populate(node: &mut ServiceNode, config: &impl NodeConfig) -> Result<()> {
    for entry in config.methods() {
        let token = method_token(&entry.method);
        let method = Method::from_bytes(token.as_bytes())
            .map_err(|e| Error::InvalidService(format!("method {:?}: {}", entry.method, e)))?;
        let handler = entry.reply.handler()?;
        node.register_method_handler(method, move |call| handler(call))?;
    }

    if let Some(fallback) = config.fallback() {
        let handler = fallback.handler()?;
        node.set_fallback_handler(move |call| handler(call));
    }

    for route in config.routes() {
        let mut child = ServiceNode::new(route.name.clone(), PathMatcher::new(&route.path)?);
        populate(&mut child, route)?;
        node.register_handler(child)?;
    }
    Ok(())
}

impl FixtureConfig {
    /// Build a router from this fixture. Run [`validate_fixture`] first for
    /// a full problem report; this stops at the first error.
    ///
    /// [`validate_fixture`]: crate::config::validation::validate_fixture
    pub fn build_router(&self) -> Result<Router> {
        let version = self.protocol.http_version().ok_or_else(|| {
            Error::Config(format!(
                "protocol version {:?} is not a known HTTP version",
                self.protocol.version
            ))
        })?;

        let mut router = Router::new().with_version(version);
        for service in &self.services {
            let mut node = ServiceNode::new(service.name.clone(), service.origin.matcher());
            populate(&mut node, service)?;
            router.register_service(service.service_key(), node)?;
        }

        tracing::info!(services = router.len(), version = ?version, "Fixture loaded");
        Ok(router)
    }
}
