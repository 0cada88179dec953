//! Structured logging setup built on `tracing`.
//!
//! One `init()` at process start; everything else logs through the
//! `tracing` macros with structured fields (peer address, transport,
//! rejection kind) rather than formatted strings.

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Clone)]
pub struct EventLogger;

impl EventLogger {
    /// Installs the global subscriber. `RUST_LOG` overrides the `info`
    /// default.
    pub fn init() {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .init()
    }
}
