//! URL matching logic.
//!
//! # Responsibilities
//! - Match the origin (scheme, host, port) of a request URL
//! - Match the path of a request URL against a regular expression
//! - Report misconfigured matchers as errors instead of silent misses
//!
//! # Design Decisions
//! - Matchers are a closed enum dispatched with `match`; a service node asks
//!   the enum whether it is origin-capable instead of inspecting types
//! - Host matching is case-insensitive, path matching is case-sensitive
//! - An unset protocol or port is a wildcard for that field only
//! - `http`/80 and `https`/443 are aliases of each other, but only when the
//!   configured pair is one of them; a hit on the alias set skips both the
//!   protocol and the port check

use std::borrow::Cow;
use std::collections::HashSet;
use std::net::IpAddr;

use percent_encoding::percent_decode_str;
use regex::Regex;
use url::{Host, Url};

use crate::error::{Error, Result};

/// Protocol/port pairs treated as interchangeable.
const CANONICAL_PAIRS: [(&str, u16); 2] = [("http", 80), ("https", 443)];

/// Host of `url` without the brackets around IPv6 literals.
fn request_host(url: &Url) -> Cow<'_, str> {
    match url.host() {
        Some(Host::Domain(domain)) => Cow::Borrowed(domain),
        Some(Host::Ipv4(addr)) => Cow::Owned(addr.to_string()),
        Some(Host::Ipv6(addr)) => Cow::Owned(addr.to_string()),
        None => Cow::Borrowed(""),
    }
}

/// Compare hosts case-insensitively; IP literals compare by address.
fn same_host(configured: &str, actual: &str) -> bool {
    match (configured.parse::<IpAddr>(), actual.parse::<IpAddr>()) {
        (Ok(a), Ok(b)) => a == b,
        _ => configured.eq_ignore_ascii_case(actual),
    }
}

fn pair_key(protocol: Option<&str>, port: Option<u16>) -> String {
    match port {
        Some(port) => format!("{}:{}", protocol.unwrap_or_default(), port),
        None => format!("{}:", protocol.unwrap_or_default()),
    }
}

/// Matches the `scheme://host[:port]` portion of a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginMatcher {
    protocol: Option<String>,
    host: String,
    port: Option<u16>,
}

impl OriginMatcher {
    /// Create a matcher for `host` with any protocol and port.
    /// The host is normalized to lowercase for case-insensitive matching;
    /// an IPv6 literal may be given with or without brackets.
    pub fn new(host: impl Into<String>) -> Self {
        let host = host.into().to_lowercase();
        let host = match host.strip_prefix('[').and_then(|h| h.strip_suffix(']')) {
            Some(inner) => inner.to_string(),
            None => host,
        };
        Self {
            protocol: None,
            host,
            port: None,
        }
    }

    /// Restrict the match to a protocol (`"https"` or `"https:"`).
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        let protocol = protocol.into();
        let protocol = protocol.trim_end_matches(':').to_lowercase();
        self.protocol = (!protocol.is_empty()).then_some(protocol);
        self
    }

    /// Restrict the match to a port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn protocol(&self) -> Option<&str> {
        self.protocol.as_deref()
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Render the configured origin as `scheme://host[:port]`.
    ///
    /// Fields left unset are omitted, so a protocol-less matcher renders
    /// as `host[:port]`.
    pub fn origin_key(&self) -> String {
        let host = if self.host.contains(':') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        let mut key = match &self.protocol {
            Some(protocol) => format!("{}://{}", protocol, host),
            None => host,
        };
        if let Some(port) = self.port {
            key.push_str(&format!(":{}", port));
        }
        key
    }

    /// True when the configured pair coincides with a canonical pair,
    /// either by protocol (port unset or equal) or, with no protocol, by port.
    fn is_canonical(&self) -> bool {
        match (self.protocol.as_deref(), self.port) {
            (Some(protocol), port) => CANONICAL_PAIRS
                .iter()
                .any(|(p, n)| *p == protocol && port.map_or(true, |port| port == *n)),
            (None, Some(port)) => CANONICAL_PAIRS.iter().any(|(_, n)| *n == port),
            (None, None) => false,
        }
    }

    fn aliases(&self) -> HashSet<String> {
        let mut aliases = HashSet::new();
        aliases.insert(pair_key(self.protocol.as_deref(), self.port));
        if self.is_canonical() {
            for (protocol, port) in CANONICAL_PAIRS {
                aliases.insert(pair_key(Some(protocol), Some(port)));
            }
        }
        aliases
    }

    /// Returns true if `url` targets this origin.
    pub fn is_match(&self, url: &Url) -> Result<bool> {
        if self.host.is_empty() {
            tracing::error!(url = %url, "Origin matcher has no host configured");
            return Err(Error::Config(
                "origin matcher is missing its host configuration".into(),
            ));
        }

        let host = request_host(url);
        if !same_host(&self.host, &host) {
            tracing::trace!(expected = %self.host, actual = %host, "Host mismatch");
            return Ok(false);
        }

        let scheme = url.scheme();
        let port = url.port_or_known_default();
        let request_pair = pair_key(Some(scheme), port);

        if !self.aliases().contains(&request_pair) {
            if let Some(protocol) = &self.protocol {
                if protocol != scheme {
                    tracing::trace!(expected = %protocol, actual = %scheme, "Protocol mismatch");
                    return Ok(false);
                }
            }
            if let Some(expected) = self.port {
                if port != Some(expected) {
                    tracing::trace!(expected, actual = ?port, "Port mismatch");
                    return Ok(false);
                }
            }
        }

        tracing::debug!(origin = %self.origin_key(), url = %url, "Origin matched");
        Ok(true)
    }
}

/// Matches the path of a URL against a regular expression.
#[derive(Debug, Clone, Default)]
pub struct PathMatcher {
    method: Option<String>,
    pattern: Option<Regex>,
}

impl PathMatcher {
    /// Compile `pattern` into a path matcher.
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .map_err(|e| Error::Config(format!("invalid path pattern {:?}: {}", pattern, e)))?;
        Ok(Self::from_regex(regex))
    }

    pub fn from_regex(pattern: Regex) -> Self {
        Self {
            method: None,
            pattern: Some(pattern),
        }
    }

    /// Attach an informational method label. It does not take part in matching.
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    /// The source text of the pattern, if one is configured.
    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_ref().map(Regex::as_str)
    }

    /// Returns true if the percent-decoded path of `url` matches the pattern.
    pub fn is_match(&self, url: &Url) -> Result<bool> {
        let pattern = match &self.pattern {
            Some(pattern) if !pattern.as_str().is_empty() => pattern,
            _ => {
                tracing::error!(url = %url, "Path matcher has no pattern to match against");
                return Err(Error::Config(
                    "path matcher is missing its regular expression".into(),
                ));
            }
        };

        let path = percent_decode_str(url.path()).decode_utf8_lossy();
        let matched = pattern.is_match(&path);
        tracing::trace!(pattern = %pattern, path = %path, matched, "Path match attempt");
        Ok(matched)
    }
}

/// The matcher owned by a service node.
#[derive(Debug, Clone)]
pub enum UriMatcher {
    Origin(OriginMatcher),
    Path(PathMatcher),
}

impl UriMatcher {
    pub fn is_match(&self, url: &Url) -> Result<bool> {
        match self {
            UriMatcher::Origin(m) => m.is_match(url),
            UriMatcher::Path(m) => m.is_match(url),
        }
    }

    /// Origin matchers may only sit at the root of a service tree.
    pub fn is_origin(&self) -> bool {
        matches!(self, UriMatcher::Origin(_))
    }

    pub fn as_origin(&self) -> Option<&OriginMatcher> {
        match self {
            UriMatcher::Origin(m) => Some(m),
            UriMatcher::Path(_) => None,
        }
    }

    pub fn as_path(&self) -> Option<&PathMatcher> {
        match self {
            UriMatcher::Path(m) => Some(m),
            UriMatcher::Origin(_) => None,
        }
    }
}

impl From<OriginMatcher> for UriMatcher {
    fn from(m: OriginMatcher) -> Self {
        UriMatcher::Origin(m)
    }
}

impl From<PathMatcher> for UriMatcher {
    fn from(m: PathMatcher) -> Self {
        UriMatcher::Path(m)
    }
}
