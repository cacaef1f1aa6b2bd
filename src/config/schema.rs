//! Fixture schema definitions.
//!
//! A fixture declares static mock services: an origin, per-verb replies,
//! an optional fallback reply and nested routes. All types derive Serde
//! traits for deserialization from TOML files.

use std::collections::BTreeMap;

use http::Version;
use serde::{Deserialize, Serialize};

/// Root of a fixture file.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FixtureConfig {
    /// Protocol settings stamped on every response.
    pub protocol: ProtocolConfig,

    /// Root services, registered in file order.
    pub services: Vec<ServiceConfig>,
}

/// Protocol settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Response version, e.g. "HTTP/1.1".
    pub version: String,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            version: "HTTP/1.1".to_string(),
        }
    }
}

impl ProtocolConfig {
    /// Parse the configured version. `None` if it is not a known HTTP version.
    pub fn http_version(&self) -> Option<Version> {
        match self.version.trim().to_ascii_uppercase().as_str() {
            "HTTP/0.9" => Some(Version::HTTP_09),
            "HTTP/1.0" => Some(Version::HTTP_10),
            "HTTP/1.1" => Some(Version::HTTP_11),
            "HTTP/2" | "HTTP/2.0" => Some(Version::HTTP_2),
            "HTTP/3" | "HTTP/3.0" => Some(Version::HTTP_3),
            _ => None,
        }
    }
}

/// A root service bound to an origin.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Service name for logging.
    pub name: String,

    /// Registry key. Defaults to the origin key.
    #[serde(default)]
    pub key: Option<String>,

    /// Origin the service answers for.
    pub origin: OriginConfig,

    /// Static replies per verb.
    #[serde(default)]
    pub methods: Vec<MethodConfig>,

    /// Reply when no verb is registered and no route matches.
    #[serde(default)]
    pub fallback: Option<StaticReplyConfig>,

    /// Nested sub-services.
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
}

/// Origin match conditions.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct OriginConfig {
    /// Scheme without the trailing colon. Empty matches any scheme.
    pub protocol: String,

    /// Host name, compared case-insensitively.
    pub host: String,

    /// Port. Unset matches any port.
    pub port: Option<u16>,
}

/// A sub-service matched by a path pattern.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Name, unique among its siblings.
    pub name: String,

    /// Regex matched against the URL path. Must start with `^` and stay open at the end.
    pub path: String,

    #[serde(default)]
    pub methods: Vec<MethodConfig>,

    #[serde(default)]
    pub fallback: Option<StaticReplyConfig>,

    #[serde(default)]
    pub routes: Vec<RouteConfig>,
}

/// A static reply bound to one verb.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MethodConfig {
    /// Verb token, e.g. "GET".
    pub method: String,

    #[serde(flatten)]
    pub reply: StaticReplyConfig,
}

/// A canned reply.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticReplyConfig {
    pub status: u16,
    pub body: String,
    pub headers: BTreeMap<String, String>,
}

impl Default for StaticReplyConfig {
    fn default() -> Self {
        Self {
            status: 200,
            body: String::new(),
            headers: BTreeMap::new(),
        }
    }
}

/// Node-level fields shared by services and routes.
pub(crate) trait NodeConfig {
    fn name(&self) -> &str;
    fn methods(&self) -> &[MethodConfig];
    fn fallback(&self) -> Option<&StaticReplyConfig>;
    fn routes(&self) -> &[RouteConfig];
}

impl NodeConfig for ServiceConfig {
    fn name(&self) -> &str {
        &self.name
    }
    fn methods(&self) -> &[MethodConfig] {
        &self.methods
    }
    fn fallback(&self) -> Option<&StaticReplyConfig> {
        self.fallback.as_ref()
    }
    fn routes(&self) -> &[RouteConfig] {
        &self.routes
    }
}

impl NodeConfig for RouteConfig {
    fn name(&self) -> &str {
        &self.name
    }
    fn methods(&self) -> &[MethodConfig] {
        &self.methods
    }
    fn fallback(&self) -> Option<&StaticReplyConfig> {
        self.fallback.as_ref()
    }
    fn routes(&self) -> &[RouteConfig] {
        &self.routes
    }
}
