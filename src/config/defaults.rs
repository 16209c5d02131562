//! Built-in defaults (layer 1)

use serde::{Deserialize, Serialize};

use crate::timeout::DEFAULT_POLL_INTERVAL_SECONDS;

/// Built-in default configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// Delay between polls in seconds (default: 10)
    pub poll_interval_seconds: u64,

    /// Retries requested from the listing source per poll (default: 2)
    pub retry_count: u32,

    /// Return processed builds that are in no reportable sub-state (default: false)
    pub accept_processed: bool,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            poll_interval_seconds: DEFAULT_POLL_INTERVAL_SECONDS,
            retry_count: build_source::DEFAULT_RETRY_COUNT,
            accept_processed: false,
        }
    }
}

impl BuiltinDefaults {
    /// Convert to JSON Value for merging
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "poll_interval_seconds": self.poll_interval_seconds,
            "retry_count": self.retry_count,
            "accept_processed": self.accept_processed,
            "source": {
                "args": []
            }
        })
    }
}
