//! Fixture validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (status codes, protocol versions)
//! - Check tokens (verbs, header names and values) and path patterns
//! - Detect conflicting service keys, route names and verbs
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: FixtureConfig → Result<(), Vec<ValidationError>>
//! - Runs before a fixture is turned into a router

use std::collections::HashSet;

use http::{HeaderName, HeaderValue, Method, StatusCode};
use thiserror::Error;

use crate::config::schema::{FixtureConfig, NodeConfig, StaticReplyConfig};
use crate::routing::matcher::PathMatcher;
use crate::service::validate_pattern;

/// One problem found in a fixture. `at` locates it, e.g. `services[0].routes[1]`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{at}: name is required")]
    MissingName { at: String },

    #[error("{at}: origin host is required")]
    EmptyHost { at: String },

    #[error("protocol version {0:?} is not a known HTTP version")]
    InvalidVersion(String),

    #[error("{at}: {method:?} is not a valid HTTP method")]
    InvalidMethod { at: String, method: String },

    #[error("{at}: status {status} is outside 100..=999")]
    InvalidStatus { at: String, status: u16 },

    #[error("{at}: invalid header {name:?}")]
    InvalidHeader { at: String, name: String },

    #[error("{at}: path {pattern:?} rejected: {reason}")]
    InvalidPattern {
        at: String,
        pattern: String,
        reason: String,
    },

    #[error("service key {0} is declared more than once")]
    DuplicateKey(String),

    #[error("{at}: route {name} is declared more than once")]
    DuplicateRoute { at: String, name: String },

    #[error("{at}: method {method} is declared more than once")]
    DuplicateMethod { at: String, method: String },
}

/// Verb token as registered: trimmed and upper-cased.
pub(crate) fn method_token(method: &str) -> String {
    method.trim().to_ascii_uppercase()
}

/// Validate a parsed fixture, collecting every problem.
pub fn validate_fixture(config: &FixtureConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.protocol.http_version().is_none() {
        errors.push(ValidationError::InvalidVersion(config.protocol.version.clone()));
    }

    let mut keys = HashSet::new();
    for (i, service) in config.services.iter().enumerate() {
        let at = format!("services[{}]", i);

        if service.origin.host.trim().is_empty() {
            errors.push(ValidationError::EmptyHost { at: at.clone() });
        }

        let key = service.service_key();
        if !keys.insert(key.clone()) {
            errors.push(ValidationError::DuplicateKey(key));
        }

        validate_node(service, &at, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_node(node: &impl NodeConfig, at: &str, errors: &mut Vec<ValidationError>) {
    if node.name().trim().is_empty() {
        errors.push(ValidationError::MissingName { at: at.to_string() });
    }

    let mut methods = HashSet::new();
    for (i, entry) in node.methods().iter().enumerate() {
        let method_at = format!("{}.methods[{}]", at, i);
        let token = method_token(&entry.method);
        if token.is_empty() || Method::from_bytes(token.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidMethod {
                at: method_at.clone(),
                method: entry.method.clone(),
            });
        } else if !methods.insert(token.clone()) {
            errors.push(ValidationError::DuplicateMethod {
                at: at.to_string(),
                method: token,
            });
        }
        validate_reply(&entry.reply, &method_at, errors);
    }

    if let Some(fallback) = node.fallback() {
        validate_reply(fallback, &format!("{}.fallback", at), errors);
    }

    let mut names = HashSet::new();
    for (i, route) in node.routes().iter().enumerate() {
        let route_at = format!("{}.routes[{}]", at, i);

        if !route.name.trim().is_empty() && !names.insert(route.name.as_str()) {
            errors.push(ValidationError::DuplicateRoute {
                at: at.to_string(),
                name: route.name.clone(),
            });
        }

        let rejected = PathMatcher::new(&route.path)
            .and_then(|_| validate_pattern(&route.path, true))
            .err();
        if let Some(reason) = rejected {
            errors.push(ValidationError::InvalidPattern {
                at: route_at.clone(),
                pattern: route.path.clone(),
                reason: reason.to_string(),
            });
        }

        validate_node(route, &route_at, errors);
    }
}

fn validate_reply(reply: &StaticReplyConfig, at: &str, errors: &mut Vec<ValidationError>) {
    if StatusCode::from_u16(reply.status).is_err() {
        errors.push(ValidationError::InvalidStatus {
            at: at.to_string(),
            status: reply.status,
        });
    }

    for (name, value) in &reply.headers {
        if HeaderName::from_bytes(name.as_bytes()).is_err() || HeaderValue::from_str(value).is_err() {
            errors.push(ValidationError::InvalidHeader {
                at: at.to_string(),
                name: name.clone(),
            });
        }
    }
}
