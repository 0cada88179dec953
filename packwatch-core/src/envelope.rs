//! Canonical envelope record for received telemetry packets.
//!
//! One envelope is produced per accepted request, stamped with the receipt
//! time on this side (sender timestamps are not trusted). Envelopes are
//! immutable once constructed; the store only ever hands out shared
//! references to them.

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Transport a packet arrived over.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Http,
    Tcp,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Http => write!(f, "http"),
            Transport::Tcp => write!(f, "tcp"),
        }
    }
}

/// Origin of a packet: transport plus remote address.
///
/// Serialized as the flat `"tcp:192.168.100.65:5000"` form the device-side
/// tooling already understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Source {
    pub transport: Transport,
    pub addr: SocketAddr,
}

impl Source {
    pub fn new(transport: Transport, addr: SocketAddr) -> Self {
        Self { transport, addr }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.transport, self.addr)
    }
}

impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (transport, addr) = s
            .split_once(':')
            .ok_or_else(|| format!("malformed source: {s}"))?;
        let transport = match transport {
            "http" => Transport::Http,
            "tcp" => Transport::Tcp,
            other => return Err(format!("unknown transport: {other}")),
        };
        let addr = addr
            .parse::<SocketAddr>()
            .map_err(|e| format!("malformed source address: {e}"))?;
        Ok(Self { transport, addr })
    }
}

impl Serialize for Source {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Source {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Payload arm of an envelope.
///
/// `Structured` holds a successfully parsed JSON document; `Raw` preserves
/// the body verbatim when no strict parse was required and none succeeded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Payload {
    #[serde(rename = "json")]
    Structured(serde_json::Value),
    #[serde(rename = "raw")]
    Raw(String),
}

impl Payload {
    pub fn is_structured(&self) -> bool {
        matches!(self, Payload::Structured(_))
    }

    /// Structured view of the payload, if it has one.
    pub fn as_value(&self) -> Option<&serde_json::Value> {
        match self {
            Payload::Structured(value) => Some(value),
            Payload::Raw(_) => None,
        }
    }

    /// The payload as a JSON value for sinks and responses: structured
    /// payloads pass through, raw payloads become JSON strings.
    pub fn to_value(&self) -> serde_json::Value {
        match self {
            Payload::Structured(value) => value.clone(),
            Payload::Raw(text) => serde_json::Value::String(text.clone()),
        }
    }
}

/// Canonical stored record: receipt timestamp, origin, tagged payload.
///
/// Wire form matches the legacy relay records:
/// `{"timestamp": …, "source": "http:…", "type": "json"|"raw", "data": …}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub timestamp: DateTime<Utc>,
    pub source: Source,
    #[serde(flatten)]
    pub payload: Payload,
}

impl Envelope {
    /// Stamps a payload with the current receipt time.
    pub fn now(source: Source, payload: Payload) -> Self {
        Self {
            timestamp: Utc::now(),
            source,
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn source(s: &str) -> Source {
        s.parse().unwrap()
    }

    #[test]
    fn source_round_trips_through_display() {
        let src = source("tcp:192.168.100.65:5000");
        assert_eq!(src.transport, Transport::Tcp);
        assert_eq!(src.to_string(), "tcp:192.168.100.65:5000");
        assert_eq!(src.to_string().parse::<Source>().unwrap(), src);
    }

    #[test]
    fn source_rejects_unknown_transport() {
        assert!("udp:1.2.3.4:9".parse::<Source>().is_err());
        assert!("nonsense".parse::<Source>().is_err());
    }

    #[test]
    fn structured_envelope_wire_form() {
        let envelope = Envelope::now(
            source("http:10.0.0.7:41000"),
            Payload::Structured(json!({"soc": 87})),
        );
        let wire = serde_json::to_value(&envelope).unwrap();
        assert_eq!(wire["source"], "http:10.0.0.7:41000");
        assert_eq!(wire["type"], "json");
        assert_eq!(wire["data"], json!({"soc": 87}));
        assert!(wire["timestamp"].is_string());
    }

    #[test]
    fn raw_envelope_wire_form() {
        let envelope = Envelope::now(
            source("tcp:10.0.0.7:41001"),
            Payload::Raw("not json".into()),
        );
        let wire = serde_json::to_value(&envelope).unwrap();
        assert_eq!(wire["type"], "raw");
        assert_eq!(wire["data"], "not json");
    }

    #[test]
    fn envelope_round_trips() {
        let envelope = Envelope::now(
            source("http:10.0.0.7:41000"),
            Payload::Structured(json!({"slaves": [{"id": 1}]})),
        );
        let wire = serde_json::to_string(&envelope).unwrap();
        let back: Envelope = serde_json::from_str(&wire).unwrap();
        assert_eq!(back, envelope);
    }
}
