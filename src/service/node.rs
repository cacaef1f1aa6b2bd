//! The recursive service tree.
//!
//! # Responsibilities
//! - Own one matcher, a verb handler map, a fallback handler and named children
//! - Validate children before they are attached
//! - Resolve the handler for a URL by descending through matching children
//!
//! # Design Decisions
//! - Root vs sub-service is decided by the matcher: origin matchers are root-only
//! - Children are scanned in no particular order; the first match wins
//! - A matching child always beats the node's own verb map and fallback
//! - Registration needs `&mut self`, resolution only `&self`

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use http::Method;
use tower::BoxError;
use url::Url;

use crate::error::{Error, Registration, Result};
use crate::http::call::Call;
use crate::http::reply::Reply;
use crate::http::status;
use crate::routing::matcher::UriMatcher;
use crate::service::handler::{self, Handler, ResolvedHandler};

/// Check a path pattern against the anchoring rule.
///
/// Every pattern must start with `^`. A sub-service pattern must leave the
/// end open so nested routes can extend it; a leaf pattern must end with `$`.
pub fn validate_pattern(pattern: &str, is_sub_service: bool) -> Result<()> {
    if !pattern.starts_with('^') {
        tracing::debug!(pattern, "Pattern does not start with ^");
        return Err(Error::InvalidService(format!(
            "pattern {:?} must start with ^",
            pattern
        )));
    }

    let anchored_end = pattern.ends_with('$');
    if is_sub_service && anchored_end {
        return Err(Error::InvalidService(format!(
            "sub-service pattern {:?} must not end with $",
            pattern
        )));
    }
    if !is_sub_service && !anchored_end {
        return Err(Error::InvalidService(format!(
            "pattern {:?} must end with $",
            pattern
        )));
    }
    Ok(())
}

/// A mock service, or a sub-route of one.
pub struct ServiceNode {
    name: String,
    matcher: UriMatcher,
    sub_service: bool,
    methods: HashMap<Method, Handler>,
    fallback: Handler,
    children: HashMap<String, ServiceNode>,
}

impl ServiceNode {
    pub fn new(name: impl Into<String>, matcher: impl Into<UriMatcher>) -> Self {
        let matcher = matcher.into();
        Self {
            name: name.into(),
            sub_service: !matcher.is_origin(),
            matcher,
            methods: HashMap::new(),
            fallback: handler::unhandled(),
            children: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matcher(&self) -> &UriMatcher {
        &self.matcher
    }

    pub fn is_sub_service(&self) -> bool {
        self.sub_service
    }

    pub fn child(&self, name: &str) -> Option<&ServiceNode> {
        self.children.get(name)
    }

    pub fn children(&self) -> impl Iterator<Item = &ServiceNode> {
        self.children.values()
    }

    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.methods.keys()
    }

    pub fn fallback_handler(&self) -> &Handler {
        &self.fallback
    }

    /// Replace the fallback used when no child and no verb handler applies.
    pub fn set_fallback_handler<F>(&mut self, f: F)
    where
        F: Fn(&Call) -> Result<Reply, BoxError> + Send + Sync + 'static,
    {
        self.fallback = Arc::new(f);
    }

    /// Register the handler for one HTTP method on this node.
    pub fn register_method_handler<F>(&mut self, method: Method, f: F) -> Result<()>
    where
        F: Fn(&Call) -> Result<Reply, BoxError> + Send + Sync + 'static,
    {
        if self.methods.contains_key(&method) {
            tracing::warn!(service = %self.name, %method, "Method already registered");
            return Err(Error::duplicate(Registration::Method, method.as_str()));
        }
        tracing::debug!(service = %self.name, %method, "Registered method handler");
        self.methods.insert(method, Arc::new(f));
        Ok(())
    }

    /// Attach `child` as a sub-service of this node.
    pub fn register_handler(&mut self, child: ServiceNode) -> Result<()> {
        if child.name.is_empty() {
            return Err(Error::InvalidService("sub-service must have a name".into()));
        }

        if !child.sub_service || child.matcher.is_origin() {
            return Err(Error::InvalidService(format!(
                "{} cannot be a sub-service: origin matchers are root-only",
                child.name
            )));
        }

        if let UriMatcher::Path(path) = &child.matcher {
            validate_pattern(path.pattern().unwrap_or_default(), true)?;
        }

        if self.children.contains_key(&child.name) {
            tracing::warn!(service = %self.name, child = %child.name, "Sub-service already registered");
            return Err(Error::duplicate(Registration::SubService, child.name));
        }

        tracing::debug!(service = %self.name, child = %child.name, "Registered sub-service");
        self.children.insert(child.name.clone(), child);
        Ok(())
    }

    /// Resolve the handler answering `url`.
    ///
    /// Descends into the first matching child. A matcher error aborts the
    /// descent and is returned wrapped with the child's name.
    pub fn get_handler(&self, url: &Url) -> Result<ResolvedHandler<'_>> {
        for (name, child) in &self.children {
            let matched = child.matcher.is_match(url).map_err(|e| {
                tracing::error!(service = %self.name, child = %name, error = %e, "Sub-service matcher failed");
                Error::dispatch(name.clone(), e)
            })?;
            if matched {
                tracing::debug!(service = %self.name, child = %name, url = %url, "Sub-service matched");
                return child.get_handler(url);
            }
        }

        if !self.methods.is_empty() {
            tracing::debug!(service = %self.name, methods = self.methods.len(), "Using method handlers");
            return Ok(ResolvedHandler::Methods(self));
        }

        tracing::debug!(service = %self.name, "Using fallback handler");
        Ok(ResolvedHandler::Fallback(self))
    }

    /// Answer `call` from the verb map, or with a 405 reply naming the
    /// method and URL when the method is not registered.
    pub fn dispatch_method(&self, call: &Call) -> Result<Reply, BoxError> {
        match self.methods.get(call.method()) {
            Some(handler) => handler(call),
            None => {
                tracing::debug!(service = %self.name, method = %call.method(), "Method not supported");
                Ok(Reply::text(
                    status::METHOD_NOT_SUPPORTED,
                    format!("{} on {} is unhandled", call.method(), call.url()),
                ))
            }
        }
    }
}

impl fmt::Debug for ServiceNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceNode")
            .field("name", &self.name)
            .field("matcher", &self.matcher)
            .field("sub_service", &self.sub_service)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("children", &self.children)
            .finish()
    }
}
