//! Fixture loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::FixtureConfig;
use crate::config::validation::{validate_fixture, ValidationError};

/// Why a fixture could not be loaded.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[source] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate a fixture from TOML text.
pub fn parse_fixture(content: &str) -> Result<FixtureConfig, LoadError> {
    let config: FixtureConfig = toml::from_str(content).map_err(LoadError::Parse)?;

    validate_fixture(&config).map_err(LoadError::Validation)?;

    Ok(config)
}

/// Load and validate a fixture from a TOML file.
pub fn load_fixture(path: &Path) -> Result<FixtureConfig, LoadError> {
    let content = fs::read_to_string(path).map_err(LoadError::Io)?;
    let config = parse_fixture(&content)?;
    tracing::debug!(path = %path.display(), services = config.services.len(), "Fixture parsed");
    Ok(config)
}
