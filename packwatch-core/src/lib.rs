//! # packwatch-core
//!
//! Foundation layer for the telemetry relay: the canonical envelope record,
//! the concurrent in-memory store, and the optional JSONL write-behind sink.
//!
//! ### Key Submodules:
//! - `envelope`: Immutable receipt record for every accepted packet
//! - `store`: Mode-switched (history / latest-only) bounded envelope store
//! - `sink`: Date-partitioned append-only JSONL side channel

pub mod envelope;
pub mod sink;
pub mod store;

pub use envelope::{Envelope, Payload, Source, Transport};
pub use store::{EnvelopeStore, Order, StoreMode};
