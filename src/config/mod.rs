//! Engine configuration from `preview.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── monitor    # [monitor]
//! │   ├── queue      # [queue]
//! │   ├── triage     # [triage]
//! │   └── watch      # [watch]
//! ├── types/         # ConfigError, ConfigDiagnostics
//! ├── util.rs        # Config file lookup
//! └── mod.rs         # PreviewConfig (this file)
//! ```
//!
//! Every section is optional; a missing file means all defaults.

mod section;
mod types;
mod util;

pub use section::{MonitorConfig, QueueConfig, TriageConfig, WatchConfig};
pub use types::{ConfigDiagnostic, ConfigDiagnostics, ConfigError};

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use util::find_config_file;

/// Default config file name.
pub const CONFIG_FILE: &str = "preview.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing preview.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Absolute path to the config file, if one was loaded (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    pub queue: QueueConfig,
    pub triage: TriageConfig,
    pub monitor: MonitorConfig,
    pub watch: WatchConfig,
}

impl PreviewConfig {
    /// Locate and load the configuration.
    ///
    /// An explicit path must exist. Otherwise `preview.toml` is searched
    /// upward from `start`; when none is found the defaults are used.
    pub fn load(explicit: Option<&Path>, start: &Path) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) if !path.exists() => {
                return Err(ConfigError::Io(
                    path.to_path_buf(),
                    std::io::Error::new(std::io::ErrorKind::NotFound, "config file not found"),
                ));
            }
            Some(path) => Some(path.to_path_buf()),
            None => find_config_file(Path::new(CONFIG_FILE), start),
        };

        match path {
            Some(path) => Self::from_path(&path),
            None => {
                crate::debug!("config"; "no {} found, using defaults", CONFIG_FILE);
                Ok(Self::default())
            }
        }
    }

    /// Parse and validate a TOML string. Unknown fields are ignored silently.
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let (config, _) = Self::parse_with_ignored(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from file with unknown field detection.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (mut config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        config.validate()?;
        config.config_path = Some(path.to_path_buf());

        // A relative watch root is relative to the config file
        if let Some(root) = config.watch.root.take() {
            config.watch.root = Some(match path.parent() {
                Some(parent) if root.is_relative() => parent.join(root),
                _ => root,
            });
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    pub fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();

        if self.queue.yield_every == 0 {
            diag.error_with_hint(
                "queue.yield_every",
                "must be greater than 0",
                "the default is 32",
            );
        }
        if self.triage.history_capacity == 0 {
            diag.error("triage.history_capacity", "must be greater than 0");
        }
        if self.monitor.log_capacity == 0 {
            diag.error("monitor.log_capacity", "must be greater than 0");
        }

        diag.into_result()
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }
}
