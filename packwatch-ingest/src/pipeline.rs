//! Commit path shared by every transport: normalize, store, side effects.
//!
//! Both the HTTP handlers and the TCP connection tasks hand bodies to this
//! pipeline, so metrics and the write-behind sink behave identically no
//! matter how a packet arrived. The pipeline owns nothing mutable itself;
//! the store keeps its own exclusion.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use packwatch_core::sink::JsonlSink;
use packwatch_core::{Envelope, EnvelopeStore};
use packwatch_telemetry::MetricsRecorder;
use tracing::{debug, warn};

use crate::error::IngestError;
use crate::normalize::Normalizer;

pub struct IngestPipeline {
    normalizer: Normalizer,
    store: Arc<EnvelopeStore>,
    sink: Option<(Arc<JsonlSink>, String)>,
    metrics: Arc<MetricsRecorder>,
}

impl IngestPipeline {
    pub fn new(
        normalizer: Normalizer,
        store: Arc<EnvelopeStore>,
        metrics: Arc<MetricsRecorder>,
    ) -> Self {
        Self {
            normalizer,
            store,
            sink: None,
            metrics,
        }
    }

    /// Attaches the write-behind sink; `kind` tags the partition files.
    pub fn with_sink(mut self, sink: Arc<JsonlSink>, kind: impl Into<String>) -> Self {
        self.sink = Some((sink, kind.into()));
        self
    }

    pub fn store(&self) -> &Arc<EnvelopeStore> {
        &self.store
    }

    pub fn metrics(&self) -> &Arc<MetricsRecorder> {
        &self.metrics
    }

    /// Ingests one HTTP body; returns the envelope's arrival position.
    pub fn ingest_http(
        &self,
        body: &[u8],
        content_type: Option<&str>,
        peer: SocketAddr,
    ) -> Result<u64, IngestError> {
        let started = Instant::now();
        let envelope = self
            .normalizer
            .normalize_http(body, content_type, peer)
            .inspect_err(|e| self.metrics.inc_rejected(e.kind()))?;
        Ok(self.commit(envelope, "http", started))
    }

    /// Ingests one raw TCP frame; returns the envelope's arrival position.
    pub fn ingest_tcp(&self, frame: &[u8], peer: SocketAddr) -> Result<u64, IngestError> {
        let started = Instant::now();
        let envelope = self
            .normalizer
            .normalize_tcp(frame, peer)
            .inspect_err(|e| self.metrics.inc_rejected(e.kind()))?;
        Ok(self.commit(envelope, "tcp", started))
    }

    fn commit(&self, envelope: Envelope, transport: &str, started: Instant) -> u64 {
        if let Some((sink, kind)) = &self.sink {
            // Write-behind: a failed sink write never fails ingestion.
            if let Err(e) = sink.record(kind, &envelope) {
                warn!(error = %e, "sink write failed");
            }
        }
        let position = self.store.append(envelope);
        self.metrics.inc_ingested(transport);
        self.metrics
            .observe_ingest_seconds(started.elapsed().as_secs_f64());
        debug!(transport, position, "envelope stored");
        position
    }
}
