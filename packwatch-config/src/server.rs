//! Listener endpoint configuration.
//!
//! Binds for the HTTP surface and the optional raw TCP ingress, plus the
//! resource bounds the TCP side applies: a connection cap and an idle read
//! timeout.

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::validation;

/// Listener endpoints for the relay.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct ServerConfig {
    /// HTTP bind address, e.g. `0.0.0.0:8000`.
    #[serde(default = "default_http_bind")]
    #[validate(custom(function = validation::validate_bind_addr))]
    pub http_bind: String,

    /// Raw TCP ingress listener.
    #[validate(nested)]
    #[serde(default)]
    pub tcp: TcpListenerConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_bind: default_http_bind(),
            tcp: TcpListenerConfig::default(),
        }
    }
}

/// Raw TCP ingress parameters.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct TcpListenerConfig {
    /// Whether to accept device pushes over raw TCP at all.
    #[serde(default)]
    pub enabled: bool,

    /// TCP bind address, e.g. `0.0.0.0:5000`.
    #[serde(default = "default_tcp_bind")]
    #[validate(custom(function = validation::validate_bind_addr))]
    pub bind: String,

    /// Maximum concurrently served connections.
    #[serde(default = "default_max_connections")]
    #[validate(range(min = 1, max = 4096))]
    pub max_connections: usize,

    /// Idle read timeout (seconds) before a connection is closed.
    #[serde(default = "default_read_timeout")]
    #[validate(range(min = 1, max = 3600))]
    pub read_timeout_secs: u64,
}

fn default_http_bind() -> String {
    "0.0.0.0:8000".into()
}

fn default_tcp_bind() -> String {
    "0.0.0.0:5000".into()
}

fn default_max_connections() -> usize {
    64
}

fn default_read_timeout() -> u64 {
    30
}

impl Default for TcpListenerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind: default_tcp_bind(),
            max_connections: default_max_connections(),
            read_timeout_secs: default_read_timeout(),
        }
    }
}
