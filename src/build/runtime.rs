//! Errors and console output reported by the running preview.

use serde::{Deserialize, Serialize};

use crate::utils::time;

/// Browsers prefix uncaught errors with this.
const UNCAUGHT_PREFIX: &str = "Uncaught ";

/// An error reported by whatever executes the generated code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    /// Project path the error is attributed to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
    /// Milliseconds since the Unix epoch
    #[serde(default)]
    pub timestamp: u64,
}

impl RuntimeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_position(mut self, line: u32, column: u32) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Trim the message, drop the `Uncaught ` prefix, fill defaults.
    pub fn normalized(mut self) -> Self {
        let message = self.message.trim();
        let message = message.strip_prefix(UNCAUGHT_PREFIX).unwrap_or(message);
        self.message = if message.is_empty() {
            "Unknown runtime error".to_string()
        } else {
            message.to_string()
        };

        self.stack = self.stack.filter(|s| !s.trim().is_empty());
        self.source = self.source.filter(|s| !s.trim().is_empty());
        if self.timestamp == 0 {
            self.timestamp = time::now_millis();
        }
        self
    }

    /// Parse a JSON report as sent by a preview runtime.
    pub fn from_json(s: &str) -> Option<Self> {
        serde_json::from_str(s).ok()
    }
}

/// Console method used by the preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleLevel {
    Log,
    Info,
    Warn,
    Error,
    Debug,
}

/// One structured console call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsoleEntry {
    pub level: ConsoleLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub timestamp: u64,
}
