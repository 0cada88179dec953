//! Envelope retention configuration.

use packwatch_core::StoreMode;
use serde::{Deserialize, Serialize};
use validator::{self, Validate};

/// Retention parameters for the envelope store.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct StoreConfig {
    /// `history` keeps an ordered, capacity-bounded sequence;
    /// `latest` keeps only the most recent envelope.
    #[serde(default)]
    pub mode: StoreMode,

    /// Maximum retained envelopes in history mode (FIFO eviction beyond).
    #[serde(default = "default_capacity")]
    #[validate(range(min = 1, max = 1_000_000))]
    pub capacity: usize,
}

fn default_capacity() -> usize {
    4096
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            mode: StoreMode::default(),
            capacity: default_capacity(),
        }
    }
}
