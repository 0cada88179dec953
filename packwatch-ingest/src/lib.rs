//! # packwatch-ingest
//!
//! Ingress side of the relay: converts inbound HTTP bodies and raw TCP
//! frames into canonical envelopes, commits them through a single pipeline,
//! and runs the bounded TCP listener.
//!
//! ### Key Submodules:
//! - `normalize`: Priority-ordered parsing policy with optional schema guard
//! - `pipeline`: Normalize → store → sink commit path shared by transports
//! - `tcp`: Semaphore-bounded tokio listener speaking the `ACK\n` protocol

pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod tcp;

pub use error::IngestError;
pub use normalize::{Normalizer, SchemaGuard};
pub use pipeline::IngestPipeline;
pub use tcp::{TcpIngestServer, TcpServerConfig};
