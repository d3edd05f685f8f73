//! Event Definitions
//!
//! Every message that crosses a component boundary is one variant of
//! [`Event`]. The [`Topic`] of an event is derived from its variant, so a
//! payload can never be published under the wrong topic.
//!
//! ```text
//! FileStore --FileUpdated--> CodeBuffer --ContentChanged--> ReloadScheduler
//!     \                                                          |
//!      --FileUpdated--> BuildQueue --PreviewUpdate-->            v
//!                           |                         HotReloadSuccess/Error
//!                           --RuntimeError--> ErrorTriage --Diagnose-->
//! ```

use std::fmt;

use serde::Serialize;

use crate::buffer::Diagnostic;
use crate::build::{ConsoleEntry, RuntimeError};
use crate::core::{FileKind, Priority};
use crate::monitor::{
    DomMutation, FileLoadingReport, FilePathReport, FrameMessage, HealthReport, HostError,
    HotReloadEntry, NetworkEntry, StylesheetFailure,
};
use crate::reload::{ChangeType, ReloadTask};
use crate::triage::{DiagnoseReport, ErrorRecord};

// =============================================================================
// Event
// =============================================================================

/// What happened to the file tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileAction {
    Created,
    Updated,
    Deleted,
}

/// A typed event carried by the bus.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "topic", rename_all = "snake_case")]
pub enum Event {
    // --- file store ---
    /// Generic notification for any change to the set of files
    FileTreeChanged { action: FileAction, path: String },
    FileCreated {
        path: String,
        content: String,
        kind: FileKind,
    },
    FileUpdated {
        path: String,
        content: String,
        kind: FileKind,
        dependencies: Vec<String>,
    },
    FileDeleted { path: String },
    /// A dependent's edges were refreshed because `dependency` changed
    DependentUpdated { path: String, dependency: String },

    // --- code buffer ---
    ContentChanged { path: String, content: String },
    DiagnosticsPresent {
        path: String,
        diagnostics: Vec<Diagnostic>,
    },

    // --- build queue ---
    PreviewUpdate { path: String, priority: Priority },
    BuildCancelled { path: String },
    BuildSlow {
        path: String,
        elapsed_ms: u64,
        budget_ms: u64,
    },
    RuntimeError(RuntimeError),
    /// Ask observers to diagnose a runtime error
    DiagnoseRequest(RuntimeError),
    ConsoleLog(ConsoleEntry),

    // --- reload scheduler ---
    /// Apply one classified change; topic depends on the change type
    ApplyChange(ReloadTask),
    HotReloadSuccess { path: String, change_type: ChangeType },
    HotReloadError { path: String, error: String },

    // --- error triage ---
    ErrorHandled(ErrorRecord),
    ErrorResolved { id: u64, message: String },
    Diagnose(DiagnoseReport),

    // --- diagnostics layer ---
    DebugError(HostError),
    DebugStylesheet(StylesheetFailure),
    DebugNetwork(NetworkEntry),
    DebugDomMutation(DomMutation),
    DebugMessage(FrameMessage),
    DebugHotReload(HotReloadEntry),
    DebugFileLoading(FileLoadingReport),
    DebugFilePaths(FilePathReport),
    DebugHealth(HealthReport),
}

impl Event {
    /// Topic this event is delivered on.
    pub fn topic(&self) -> Topic {
        match self {
            Self::FileTreeChanged { .. } => Topic::FileTreeChanged,
            Self::FileCreated { .. } => Topic::FileCreated,
            Self::FileUpdated { .. } => Topic::FileUpdated,
            Self::FileDeleted { .. } => Topic::FileDeleted,
            Self::DependentUpdated { .. } => Topic::DependentUpdated,
            Self::ContentChanged { .. } => Topic::ContentChanged,
            Self::DiagnosticsPresent { .. } => Topic::DiagnosticsPresent,
            Self::PreviewUpdate { .. } => Topic::PreviewUpdate,
            Self::BuildCancelled { .. } => Topic::BuildCancelled,
            Self::BuildSlow { .. } => Topic::BuildSlow,
            Self::RuntimeError(_) => Topic::RuntimeError,
            Self::DiagnoseRequest(_) => Topic::DiagnoseRequest,
            Self::ConsoleLog(_) => Topic::ConsoleLog,
            Self::ApplyChange(task) => match task.change_type {
                ChangeType::Style => Topic::ApplyStyle,
                ChangeType::Script => Topic::ApplyScript,
                ChangeType::Markup => Topic::ApplyMarkup,
                ChangeType::Component => Topic::ApplyComponent,
            },
            Self::HotReloadSuccess { .. } => Topic::HotReloadSuccess,
            Self::HotReloadError { .. } => Topic::HotReloadError,
            Self::ErrorHandled(_) => Topic::ErrorHandled,
            Self::ErrorResolved { .. } => Topic::ErrorResolved,
            Self::Diagnose(_) => Topic::Diagnose,
            Self::DebugError(_) => Topic::DebugError,
            Self::DebugStylesheet(_) => Topic::DebugStylesheet,
            Self::DebugNetwork(_) => Topic::DebugNetwork,
            Self::DebugDomMutation(_) => Topic::DebugDomMutation,
            Self::DebugMessage(_) => Topic::DebugMessage,
            Self::DebugHotReload(_) => Topic::DebugHotReload,
            Self::DebugFileLoading(_) => Topic::DebugFileLoading,
            Self::DebugFilePaths(_) => Topic::DebugFilePaths,
            Self::DebugHealth(_) => Topic::DebugHealth,
        }
    }

    /// Serialize to JSON, falling back to just the topic name.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| format!(r#"{{"topic":"{}"}}"#, self.topic()))
    }
}

// =============================================================================
// Topic
// =============================================================================

/// Subscription key. One per event variant, except [`Event::ApplyChange`]
/// which fans out to one topic per change type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Topic {
    FileTreeChanged,
    FileCreated,
    FileUpdated,
    FileDeleted,
    DependentUpdated,
    ContentChanged,
    DiagnosticsPresent,
    PreviewUpdate,
    BuildCancelled,
    BuildSlow,
    RuntimeError,
    DiagnoseRequest,
    ConsoleLog,
    ApplyStyle,
    ApplyScript,
    ApplyMarkup,
    ApplyComponent,
    HotReloadSuccess,
    HotReloadError,
    ErrorHandled,
    ErrorResolved,
    Diagnose,
    DebugError,
    DebugStylesheet,
    DebugNetwork,
    DebugDomMutation,
    DebugMessage,
    DebugHotReload,
    DebugFileLoading,
    DebugFilePaths,
    DebugHealth,
}

impl Topic {
    /// Wire-style name, e.g. `file:updated`.
    pub fn name(self) -> &'static str {
        match self {
            Self::FileTreeChanged => "file:tree-changed",
            Self::FileCreated => "file:created",
            Self::FileUpdated => "file:updated",
            Self::FileDeleted => "file:deleted",
            Self::DependentUpdated => "file:dependent-updated",
            Self::ContentChanged => "buffer:content-changed",
            Self::DiagnosticsPresent => "buffer:diagnostics",
            Self::PreviewUpdate => "preview:update",
            Self::BuildCancelled => "preview:cancelled",
            Self::BuildSlow => "preview:slow",
            Self::RuntimeError => "preview:runtime-error",
            Self::DiagnoseRequest => "preview:diagnose",
            Self::ConsoleLog => "preview:console",
            Self::ApplyStyle => "reload:apply-style",
            Self::ApplyScript => "reload:apply-script",
            Self::ApplyMarkup => "reload:apply-markup",
            Self::ApplyComponent => "reload:apply-component",
            Self::HotReloadSuccess => "hot-reload:success",
            Self::HotReloadError => "hot-reload:error",
            Self::ErrorHandled => "error:handled",
            Self::ErrorResolved => "error:resolved",
            Self::Diagnose => "error:diagnose",
            Self::DebugError => "debug:error",
            Self::DebugStylesheet => "debug:stylesheet",
            Self::DebugNetwork => "debug:network",
            Self::DebugDomMutation => "debug:dom",
            Self::DebugMessage => "debug:message",
            Self::DebugHotReload => "debug:hot-reload",
            Self::DebugFileLoading => "debug:file-loading",
            Self::DebugFilePaths => "debug:file-paths",
            Self::DebugHealth => "debug:health",
        }
    }

    /// Whether this topic belongs to the `debug:*` family.
    pub fn is_debug(self) -> bool {
        self.name().starts_with("debug:")
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_change_topic_follows_change_type() {
        let task = |change_type| {
            Event::ApplyChange(ReloadTask {
                path: "/a".into(),
                content: String::new(),
                change_type,
                timestamp: 0,
            })
        };
        assert_eq!(task(ChangeType::Style).topic(), Topic::ApplyStyle);
        assert_eq!(task(ChangeType::Script).topic(), Topic::ApplyScript);
        assert_eq!(task(ChangeType::Markup).topic(), Topic::ApplyMarkup);
        assert_eq!(task(ChangeType::Component).topic(), Topic::ApplyComponent);
    }

    #[test]
    fn test_event_json_is_tagged() {
        let event = Event::FileDeleted { path: "/a.ts".into() };
        let json = event.to_json();
        assert!(json.contains(r#""topic":"file_deleted""#));
        assert!(json.contains(r#""path":"/a.ts""#));
    }

    #[test]
    fn test_debug_family() {
        assert!(Topic::DebugHealth.is_debug());
        assert!(Topic::DebugNetwork.is_debug());
        assert!(!Topic::HotReloadError.is_debug());
    }
}
