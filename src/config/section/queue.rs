//! `[queue]` section configuration.
//!
//! Shared by the build queue and the reload scheduler.
//!
//! # Example
//!
//! ```toml
//! [queue]
//! yield_every = 32        # Yield the thread after this many tasks
//! task_budget_ms = 250    # Flag tasks slower than this (0 = never)
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Yield point interval inside a drain.
    pub yield_every: usize,

    /// Per-task time budget in milliseconds.
    pub task_budget_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            yield_every: 32,
            task_budget_ms: 250,
        }
    }
}
