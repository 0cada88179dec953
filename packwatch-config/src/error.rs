//! Error types for configuration loading and validation.

use std::path::PathBuf;
use thiserror::Error;
use validator::ValidationErrors;

/// Unified configuration error type.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Explicitly requested configuration file does not exist.
    #[error("configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// One or more fields failed validation.
    #[error("invalid configuration:\n{}", flatten_errors(.0))]
    Validation(#[from] ValidationErrors),

    /// Figment extraction error (bad YAML, type mismatch, bad env value).
    #[error("configuration parsing error: {0}")]
    Parsing(#[from] figment::Error),
}

fn flatten_errors(errors: &ValidationErrors) -> String {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                let code = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| error.code.to_string());
                format!("  {field}: {code}")
            })
        })
        .collect::<Vec<_>>()
        .join("\n")
}
