//! `[watch]` section configuration.
//!
//! Used by `preview check` and `preview watch`.
//!
//! # Example
//!
//! ```toml
//! [watch]
//! root = "src"                          # Project directory (relative to preview.toml)
//! debounce_ms = 300                     # Quiet period before a batch is applied
//! ignore = ["node_modules", ".git"]     # Directory names never loaded or watched
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Project directory. `None` means the directory given on the command line.
    pub root: Option<PathBuf>,

    pub debounce_ms: u64,

    /// Directory names skipped while loading and watching.
    pub ignore: Vec<String>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            root: None,
            debounce_ms: 300,
            ignore: ["node_modules", ".git", "target", "dist"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl WatchConfig {
    /// Whether any component of `path` is an ignored directory name.
    pub fn is_ignored(&self, path: &std::path::Path) -> bool {
        path.components().any(|c| {
            let name = c.as_os_str().to_string_lossy();
            self.ignore.iter().any(|ignored| *ignored == name)
        })
    }
}
