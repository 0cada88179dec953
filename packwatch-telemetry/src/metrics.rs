//! Prometheus metrics for the ingest and query paths.

use prometheus::{Histogram, HistogramOpts, IntCounterVec, IntGauge, Opts, Registry};

/// Owned registry plus the metric families the relay records.
#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: Registry,
    ingested_total: IntCounterVec,
    rejected_total: IntCounterVec,
    tcp_connections: IntGauge,
    ingest_latency: Histogram,
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRecorder {
    pub fn new() -> Self {
        let registry = Registry::new();

        let ingested_total = IntCounterVec::new(
            Opts::new("packwatch_envelopes_total", "Envelopes accepted and stored"),
            &["transport"],
        )
        .unwrap();
        let rejected_total = IntCounterVec::new(
            Opts::new("packwatch_rejected_total", "Inbound packets rejected"),
            &["kind"],
        )
        .unwrap();
        let tcp_connections = IntGauge::new(
            "packwatch_tcp_open_connections",
            "Currently served raw TCP connections",
        )
        .unwrap();
        let ingest_latency = Histogram::with_opts(
            HistogramOpts::new(
                "packwatch_ingest_latency_seconds",
                "Normalize-and-store time per accepted packet",
            )
            .buckets(vec![0.000_01, 0.000_1, 0.001, 0.01, 0.1]),
        )
        .unwrap();

        registry.register(Box::new(ingested_total.clone())).unwrap();
        registry.register(Box::new(rejected_total.clone())).unwrap();
        registry.register(Box::new(tcp_connections.clone())).unwrap();
        registry.register(Box::new(ingest_latency.clone())).unwrap();

        Self {
            registry,
            ingested_total,
            rejected_total,
            tcp_connections,
            ingest_latency,
        }
    }

    pub fn inc_ingested(&self, transport: &str) {
        self.ingested_total.with_label_values(&[transport]).inc();
    }

    pub fn inc_rejected(&self, kind: &str) {
        self.rejected_total.with_label_values(&[kind]).inc();
    }

    pub fn tcp_connection_opened(&self) {
        self.tcp_connections.inc();
    }

    pub fn tcp_connection_closed(&self) {
        self.tcp_connections.dec();
    }

    pub fn observe_ingest_seconds(&self, seconds: f64) {
        self.ingest_latency.observe(seconds);
    }

    /// Text exposition of everything in the registry.
    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer).unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_exposition() {
        let metrics = MetricsRecorder::new();
        metrics.inc_ingested("http");
        metrics.inc_rejected("bad_payload");
        metrics.tcp_connection_opened();

        let text = metrics.gather_metrics().unwrap();
        assert!(text.contains("packwatch_envelopes_total"));
        assert!(text.contains("packwatch_rejected_total"));
        assert!(text.contains("packwatch_tcp_open_connections 1"));
    }
}
