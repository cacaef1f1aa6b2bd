//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the process-wide subscriber for the binary
//! - Configure log level from the environment or a default filter
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - `RUST_LOG` wins over the default filter when set
//! - Library code only emits events; installing a subscriber is the caller's choice

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter for the binary.
pub const DEFAULT_FILTER: &str = "stackinabox=info";

/// Filter used when verbose output is requested.
pub const VERBOSE_FILTER: &str = "stackinabox=debug";

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(default_filter: &str) -> Result<(), tracing_subscriber::util::TryInitError> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
}
