//! HTTP error mapping.
//!
//! Every recoverable failure resolves here into a structured body
//! `{"error": <kind>, "message": <detail>}`: ingest rejections are `400`,
//! a missing log partition is `404`, an unreachable device is `502`, a
//! disabled relay is `503`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use packwatch_core::sink::SinkError;
use packwatch_ingest::IngestError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("device relay is disabled")]
    RelayDisabled,

    #[error("device unreachable: {0}")]
    Relay(#[from] reqwest::Error),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("metrics exposition failed: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Ingest(_) => StatusCode::BAD_REQUEST,
            ApiError::RelayDisabled => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Relay(_) => StatusCode::BAD_GATEWAY,
            ApiError::Sink(SinkError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Sink(SinkError::InvalidKind(_)) => StatusCode::BAD_REQUEST,
            ApiError::Sink(_) | ApiError::Metrics(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::Ingest(e) => e.kind(),
            ApiError::RelayDisabled => "relay_disabled",
            ApiError::Relay(_) => "device_unreachable",
            ApiError::Sink(SinkError::NotFound { .. }) => "log_not_found",
            ApiError::Sink(_) => "sink_error",
            ApiError::Metrics(_) => "metrics_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(kind = self.kind(), error = %self, "request failed");
        }
        let body = Json(json!({
            "error": self.kind(),
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}
