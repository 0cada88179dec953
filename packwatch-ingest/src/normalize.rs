//! Ingress normalizer: one inbound body in, one envelope or one classified
//! error out.
//!
//! Parsing policy, in priority order (an empty body is always
//! `EmptyPayload`, whatever the declared content type):
//! 1. Declared JSON content type: strict parse, failure is `BadPayload`.
//! 2. Form-encoded body: the configured field must hold JSON; an absent or
//!    empty field is `EmptyPayload`, an undecodable or unparseable one is
//!    `BadPayload`.
//! 3. Anything else: best-effort JSON parse of the whole body, degrading to
//!    a raw payload (UTF-8 first, Latin-1 byte-preserving fallback).
//!
//! Raw TCP frames always have the raw fallback available, so they never
//! produce `BadPayload`.

use std::net::SocketAddr;

use packwatch_core::{Envelope, Payload, Source, Transport};

use crate::error::IngestError;

/// Required top-level key check on accepted payloads.
///
/// The multi-slave BMS deployments require a `slaves` array at the top
/// level; payloads without it (including raw ones) are rejected.
#[derive(Clone, Debug)]
pub struct SchemaGuard {
    key: String,
}

impl SchemaGuard {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    fn check(&self, payload: &Payload) -> Result<(), IngestError> {
        let value = payload.as_value().ok_or_else(|| {
            IngestError::InvalidSchema(format!("raw payload cannot carry '{}'", self.key))
        })?;
        match value.get(&self.key) {
            Some(v) if v.is_array() => Ok(()),
            Some(_) => Err(IngestError::InvalidSchema(format!(
                "'{}' must be an array",
                self.key
            ))),
            None => Err(IngestError::InvalidSchema(format!(
                "missing top-level '{}'",
                self.key
            ))),
        }
    }
}

/// Converts inbound requests into canonical envelopes.
#[derive(Clone, Debug)]
pub struct Normalizer {
    form_field: String,
    guard: Option<SchemaGuard>,
}

impl Normalizer {
    pub fn new(form_field: impl Into<String>) -> Self {
        Self {
            form_field: form_field.into(),
            guard: None,
        }
    }

    /// Enables the required-shape check for `key`.
    pub fn with_guard(mut self, key: impl Into<String>) -> Self {
        self.guard = Some(SchemaGuard::new(key));
        self
    }

    /// Normalizes an HTTP request body.
    pub fn normalize_http(
        &self,
        body: &[u8],
        content_type: Option<&str>,
        peer: SocketAddr,
    ) -> Result<Envelope, IngestError> {
        let payload = match ContentKind::from_declared(content_type) {
            ContentKind::Json => {
                if body.is_empty() {
                    return Err(IngestError::EmptyPayload);
                }
                Payload::Structured(serde_json::from_slice(body).map_err(IngestError::BadPayload)?)
            }
            ContentKind::Form => {
                let field = match form_field_value(body, &self.form_field) {
                    FormField::Present(value) if !value.is_empty() => value,
                    FormField::Present(_) | FormField::Absent => {
                        return Err(IngestError::EmptyPayload)
                    }
                    // The field was supplied but its escaping is broken;
                    // that is malformed data, not a missing field.
                    FormField::Undecodable => {
                        return Err(IngestError::BadPayload(bad_encoding_error()))
                    }
                };
                Payload::Structured(
                    serde_json::from_str(&field).map_err(IngestError::BadPayload)?,
                )
            }
            ContentKind::Unknown => {
                if body.is_empty() {
                    return Err(IngestError::EmptyPayload);
                }
                match serde_json::from_slice(body) {
                    Ok(value) => Payload::Structured(value),
                    Err(_) => Payload::Raw(decode_text(body)),
                }
            }
        };
        self.finish(Source::new(Transport::Http, peer), payload)
    }

    /// Normalizes one raw TCP frame.
    ///
    /// Zero-length reads are stream closure and must be handled by the
    /// caller before reaching this point.
    pub fn normalize_tcp(&self, frame: &[u8], peer: SocketAddr) -> Result<Envelope, IngestError> {
        let text = decode_text(frame);
        let trimmed = text.trim();
        let payload = match serde_json::from_str(trimmed) {
            Ok(value) => Payload::Structured(value),
            Err(_) => Payload::Raw(trimmed.to_string()),
        };
        self.finish(Source::new(Transport::Tcp, peer), payload)
    }

    fn finish(&self, source: Source, payload: Payload) -> Result<Envelope, IngestError> {
        if let Some(guard) = &self.guard {
            guard.check(&payload)?;
        }
        Ok(Envelope::now(source, payload))
    }
}

enum ContentKind {
    Json,
    Form,
    Unknown,
}

impl ContentKind {
    fn from_declared(content_type: Option<&str>) -> Self {
        let Some(declared) = content_type else {
            return ContentKind::Unknown;
        };
        // Parameters like `; charset=utf-8` do not affect the kind.
        let mime = declared
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if mime == "application/json" || mime.ends_with("+json") {
            ContentKind::Json
        } else if mime == "application/x-www-form-urlencoded" {
            ContentKind::Form
        } else {
            ContentKind::Unknown
        }
    }
}

/// UTF-8 decode with a Latin-1 fallback that preserves every input byte.
fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

enum FormField {
    Present(String),
    Absent,
    Undecodable,
}

fn bad_encoding_error() -> serde_json::Error {
    serde::de::Error::custom("malformed percent encoding in form field")
}

/// Extracts and percent-decodes one field from a form-encoded body.
fn form_field_value(body: &[u8], field: &str) -> FormField {
    let Ok(text) = std::str::from_utf8(body) else {
        return FormField::Undecodable;
    };
    for pair in text.split('&') {
        let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
        if percent_decode(name).as_deref() != Some(field) {
            continue;
        }
        return match percent_decode(value) {
            Some(decoded) => FormField::Present(decoded),
            None => FormField::Undecodable,
        };
    }
    FormField::Absent
}

fn percent_decode(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' => {
                let hex = bytes.get(i + 1..i + 3)?;
                let hex = std::str::from_utf8(hex).ok()?;
                out.push(u8::from_str_radix(hex, 16).ok()?);
                i += 2;
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8(out).ok()
}
