//! Custom validation functions for configuration.
//!
//! Shared validation logic used across multiple configuration modules.

use std::net::{IpAddr, Ipv6Addr, SocketAddr};

use validator::ValidationError;

/// Validate that a bind address parses as `host:port`.
pub fn validate_bind_addr(addr: &str) -> Result<(), ValidationError> {
    addr.parse::<SocketAddr>()
        .map(|_| ())
        .map_err(|_| ValidationError::new("invalid_bind_addr"))
}

/// Validate a field/key identifier (form field names, guard keys).
pub fn validate_identifier(name: &str) -> Result<(), ValidationError> {
    let re = regex::Regex::new("^[a-zA-Z_][a-zA-Z0-9_]*$")
        .map_err(|_| ValidationError::new("invalid_regex"))?;
    if !name.is_empty() && name.len() <= 64 && re.is_match(name) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_identifier"))
    }
}

/// Validate a hostname or IP literal for the device relay.
///
/// IPv6 literals are accepted bare (`fd00::65`) or bracketed (`[fd00::65]`);
/// everything else must look like a hostname or IPv4 address.
pub fn validate_host(host: &str) -> Result<(), ValidationError> {
    if host.parse::<IpAddr>().is_ok() {
        return Ok(());
    }
    if let Some(inner) = host.strip_prefix('[').and_then(|h| h.strip_suffix(']')) {
        return match inner.parse::<Ipv6Addr>() {
            Ok(_) => Ok(()),
            Err(_) => Err(ValidationError::new("invalid_host")),
        };
    }
    let valid = !host.is_empty()
        && host.len() <= 253
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_host"))
    }
}

/// Validate a sink kind tag (becomes part of a file name).
pub fn validate_kind_tag(kind: &str) -> Result<(), ValidationError> {
    let re = regex::Regex::new("^[a-z0-9_-]+$")
        .map_err(|_| ValidationError::new("invalid_regex"))?;
    if re.is_match(kind) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_kind_tag"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_addr_requires_port() {
        assert!(validate_bind_addr("0.0.0.0:8000").is_ok());
        assert!(validate_bind_addr("0.0.0.0").is_err());
        assert!(validate_bind_addr("not an addr").is_err());
    }

    #[test]
    fn identifier_rejects_separators() {
        assert!(validate_identifier("data").is_ok());
        assert!(validate_identifier("slaves").is_ok());
        assert!(validate_identifier("bad key").is_err());
        assert!(validate_identifier("").is_err());
    }

    #[test]
    fn host_accepts_names_and_ip_literals() {
        assert!(validate_host("bms-gateway.local").is_ok());
        assert!(validate_host("192.168.100.65").is_ok());
        assert!(validate_host("fd00::65").is_ok());
        assert!(validate_host("[fd00::65]").is_ok());
        assert!(validate_host("[not-v6]").is_err());
        assert!(validate_host("bad host").is_err());
        assert!(validate_host("").is_err());
    }

    #[test]
    fn kind_tag_rejects_path_characters() {
        assert!(validate_kind_tag("sensor").is_ok());
        assert!(validate_kind_tag("../escape").is_err());
    }
}
