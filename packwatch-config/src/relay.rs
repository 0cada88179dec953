//! Device configuration relay parameters.
//!
//! The relay forwards operator configuration to the device's own `/config`
//! endpoint and mirrors the device's current settings back. It is a pure
//! pass-through; the relay itself validates nothing beyond reachability.

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::validation;

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct RelayConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Device address on the LAN.
    #[serde(default = "default_device_host")]
    #[validate(custom(function = validation::validate_host))]
    pub device_host: String,

    /// Port of the device's embedded web server.
    #[serde(default = "default_device_port")]
    #[validate(range(min = 1, max = 65535))]
    pub device_port: u16,

    /// Request timeout (seconds) when talking to the device.
    #[serde(default = "default_timeout")]
    #[validate(range(min = 1, max = 60))]
    pub timeout_secs: u64,
}

impl RelayConfig {
    /// Base URL of the device's config endpoint.
    ///
    /// Bare IPv6 hosts are bracketed so the URL stays parseable.
    pub fn device_url(&self) -> String {
        let host = &self.device_host;
        if host.parse::<std::net::Ipv6Addr>().is_ok() {
            format!("http://[{host}]:{}/config", self.device_port)
        } else {
            format!("http://{host}:{}/config", self.device_port)
        }
    }
}

fn default_device_host() -> String {
    "192.168.100.65".into()
}

fn default_device_port() -> u16 {
    80
}

fn default_timeout() -> u64 {
    5
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            device_host: default_device_host(),
            device_port: default_device_port(),
            timeout_secs: default_timeout(),
        }
    }
}
