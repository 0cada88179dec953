//! Classified ingress errors.
//!
//! All four kinds resolve at the request or connection boundary; none
//! propagate past the ingress component. The store itself has no
//! recoverable errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    /// No body, no form field, zero-length raw content.
    #[error("no payload supplied")]
    EmptyPayload,

    /// The body declared JSON as its only interpretation and failed to parse.
    #[error("declared JSON payload failed to parse: {0}")]
    BadPayload(#[source] serde_json::Error),

    /// Parsed fine but failed the required-shape check.
    #[error("schema violation: {0}")]
    InvalidSchema(String),

    /// Connection reset or aborted mid-read (TCP only).
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),
}

impl IngestError {
    /// Stable identifier used in error bodies and reject metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            IngestError::EmptyPayload => "empty_payload",
            IngestError::BadPayload(_) => "bad_payload",
            IngestError::InvalidSchema(_) => "invalid_schema",
            IngestError::Transport(_) => "transport_error",
        }
    }
}
