//! Fixture management subsystem.
//!
//! # Data Flow
//! ```text
//! fixture file (TOML)
//!     → loader.rs (read & deserialize)
//!     → validation.rs (semantic checks, every problem reported)
//!     → FixtureConfig (validated)
//!     → build.rs (static handlers, service tree)
//!     → Router
//! ```
//!
//! # Design Decisions
//! - Fixtures are static; handlers replay canned replies
//! - All fields have defaults to allow minimal fixtures
//! - Validation separates syntactic (serde) from semantic checks

pub mod build;
pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_fixture, parse_fixture, LoadError};
pub use schema::{FixtureConfig, MethodConfig, OriginConfig, RouteConfig, ServiceConfig, StaticReplyConfig};
pub use validation::{validate_fixture, ValidationError};
