//! `[triage]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [triage]
//! history_capacity = 100      # Records kept before the oldest is evicted
//! similar_window_secs = 300   # Window for the frequency count
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriageConfig {
    pub history_capacity: usize,
    pub similar_window_secs: u64,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            history_capacity: 100,
            similar_window_secs: 300,
        }
    }
}
