//! Write-behind JSONL sink configuration.

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::validation;

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct SinkConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Directory receiving the date-partitioned `.jsonl` files.
    #[serde(default = "default_dir")]
    pub dir: String,

    /// Kind tag used for envelope records (part of the file name).
    #[serde(default = "default_kind")]
    #[validate(custom(function = validation::validate_kind_tag))]
    pub kind: String,
}

fn default_dir() -> String {
    "data".into()
}

fn default_kind() -> String {
    "sensor".into()
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: default_dir(),
            kind: default_kind(),
        }
    }
}
