//! Shared handler state.

use std::sync::Arc;

use packwatch_core::sink::JsonlSink;
use packwatch_ingest::IngestPipeline;

use crate::relay::DeviceRelay;

/// Everything the handlers share. Cheap to clone: all `Arc`s.
#[derive(Clone)]
pub struct AppState {
    /// Normalize-and-commit path, shared with the TCP listener.
    pub pipeline: Arc<IngestPipeline>,
    /// Device config relay, if enabled.
    pub relay: Option<Arc<DeviceRelay>>,
    /// Sink handle for `/api/logs` readback, if the sink is enabled.
    pub sink: Option<Arc<JsonlSink>>,
    /// Default kind tag when `/api/logs` omits `type`.
    pub log_kind: String,
}

impl AppState {
    pub fn new(pipeline: Arc<IngestPipeline>) -> Self {
        Self {
            pipeline,
            relay: None,
            sink: None,
            log_kind: "sensor".into(),
        }
    }

    pub fn with_relay(mut self, relay: Arc<DeviceRelay>) -> Self {
        self.relay = Some(relay);
        self
    }

    pub fn with_sink(mut self, sink: Arc<JsonlSink>, kind: impl Into<String>) -> Self {
        self.sink = Some(sink);
        self.log_kind = kind.into();
        self
    }
}
