//! ## packwatch-telemetry
//! **Observability for the telemetry relay**
//!
//! ### Components:
//! - `logging`: tracing subscriber initialization with env-filter control
//! - `metrics`: Prometheus registry for ingest counters and latencies

pub mod logging;
pub mod metrics;

pub use metrics::MetricsRecorder;
