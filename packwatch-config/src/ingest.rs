//! Ingress normalization policy.

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::validation;

/// Parsing policy for inbound packets.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct IngestConfig {
    /// Form field carrying JSON when devices post form-encoded bodies.
    #[serde(default = "default_form_field")]
    #[validate(custom(function = validation::validate_identifier))]
    pub form_field: String,

    /// Optional required-shape check on parsed payloads.
    #[validate(nested)]
    #[serde(default)]
    pub schema_guard: SchemaGuardConfig,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            form_field: default_form_field(),
            schema_guard: SchemaGuardConfig::default(),
        }
    }
}

/// Required top-level key guard.
///
/// When enabled, accepted payloads must be structured JSON carrying `key`
/// as an array; the multi-slave BMS deployments use `slaves`.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct SchemaGuardConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_guard_key")]
    #[validate(custom(function = validation::validate_identifier))]
    pub key: String,
}

fn default_form_field() -> String {
    "data".into()
}

fn default_guard_key() -> String {
    "slaves".into()
}

impl Default for SchemaGuardConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            key: default_guard_key(),
        }
    }
}
