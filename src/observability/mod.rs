//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Router, service tree, fixtures produce:
//!     → tracing events (registration, matching, dispatch outcome)
//!
//! Consumers:
//!     → logging.rs (global fmt subscriber for the binary)
//!     → capture.rs (thread-scoped buffer for tests)
//! ```
//!
//! # Design Decisions
//! - Structured fields on every event (service, url, status)
//! - No global subscriber from library code
//! - Capture is per thread so parallel tests do not see each other

pub mod capture;
pub mod logging;

pub use capture::{capture_logs, LogCaptureGuard, Rx};
pub use logging::init_logging;
