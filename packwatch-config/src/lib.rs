//! # Packwatch Configuration System
//!
//! Hierarchical configuration for the telemetry relay.
//!
//! ## Features
//! - **Unified Configuration**: Single source of truth across all components
//! - **Validation**: Runtime validation of ports, capacities, and field names
//! - **Environment Awareness**: Per-environment override files and env vars

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

mod error;
mod ingest;
mod relay;
mod server;
mod sink;
mod store;
mod validation;

pub use error::ConfigError;
pub use ingest::{IngestConfig, SchemaGuardConfig};
pub use relay::RelayConfig;
pub use server::{ServerConfig, TcpListenerConfig};
pub use sink::SinkConfig;
pub use store::StoreConfig;

/// Top-level configuration container for all relay components.
#[derive(Debug, Serialize, Deserialize, Validate, Default, Clone)]
pub struct PackwatchConfig {
    /// Listener endpoints (HTTP bind, optional TCP ingress).
    #[validate(nested)]
    pub server: ServerConfig,

    /// Ingress normalization policy (form field, schema guard).
    #[validate(nested)]
    pub ingest: IngestConfig,

    /// Envelope retention (mode and capacity).
    #[validate(nested)]
    pub store: StoreConfig,

    /// Device configuration relay.
    #[validate(nested)]
    pub relay: RelayConfig,

    /// JSONL write-behind sink.
    #[validate(nested)]
    pub sink: SinkConfig,
}

impl PackwatchConfig {
    /// Load configuration from default files and environment.
    ///
    /// Hierarchy:
    /// 1. Default values
    /// 2. `config/packwatch.yaml` - base settings. If missing, defaults are used.
    /// 3. `config/<environment>.yaml` - environment-specific overrides.
    /// 4. `PACKWATCH_*` environment variables (`__` separates nesting).
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(PackwatchConfig::default()));

        if Path::new("config/packwatch.yaml").exists() {
            figment = figment.merge(Yaml::file("config/packwatch.yaml"));
        } else {
            println!("config/packwatch.yaml not found, using default configuration");
        }

        let env = std::env::var("PACKWATCH_ENV").unwrap_or_else(|_| "production".into());
        let env_file = format!("config/{}.yaml", env);
        if Path::new(&env_file).exists() {
            figment = figment.merge(Yaml::file(env_file));
        }

        figment
            .merge(Env::prefixed("PACKWATCH_").split("__"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }

    /// Load configuration from a specific path, for testing and `check-config`.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(PathBuf::from(path)));
        }

        Figment::from(Serialized::defaults(PackwatchConfig::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed("PACKWATCH_").split("__"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }
}
