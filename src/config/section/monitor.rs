//! `[monitor]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [monitor]
//! log_capacity = 200   # Entries kept per debug log
//! autostart = true     # Start monitoring when the context is built
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Capacity of each bounded debug log.
    pub log_capacity: usize,

    pub autostart: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            log_capacity: 200,
            autostart: true,
        }
    }
}
