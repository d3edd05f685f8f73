//! Observation records, one type per debug log.

use serde::Serialize;
use serde_json::Value;

use crate::reload::ChangeType;
use crate::utils::time;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HostErrorKind {
    Error,
    UnhandledRejection,
}

/// Uncaught error or unhandled rejection seen by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostError {
    pub kind: HostErrorKind,
    pub message: String,
    pub source: Option<String>,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub timestamp: u64,
}

impl HostError {
    pub fn new(kind: HostErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
            line: None,
            column: None,
            timestamp: time::now_millis(),
        }
    }

    pub fn with_location(mut self, source: impl Into<String>, line: u32, column: u32) -> Self {
        self.source = Some(source.into());
        self.line = Some(line);
        self.column = Some(column);
        self
    }
}

/// A stylesheet that failed to load or parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StylesheetFailure {
    pub href: String,
    pub reason: String,
    pub timestamp: u64,
}

impl StylesheetFailure {
    pub fn new(href: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            reason: reason.into(),
            timestamp: time::now_millis(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkStatus {
    Started,
    Completed,
    Failed,
}

/// One phase of an intercepted network call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkEntry {
    /// `fetch`, `xhr`, ...
    #[serde(rename = "type")]
    pub request_type: String,
    pub url: String,
    pub status: NetworkStatus,
    pub timestamp: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NetworkEntry {
    pub fn started(request_type: &str, url: &str) -> Self {
        Self {
            request_type: request_type.to_string(),
            url: url.to_string(),
            status: NetworkStatus::Started,
            timestamp: time::now_millis(),
            duration_ms: None,
            status_code: None,
            error: None,
        }
    }

    pub fn completed(request_type: &str, url: &str, status_code: u16, duration_ms: u64) -> Self {
        Self {
            status: NetworkStatus::Completed,
            status_code: Some(status_code),
            duration_ms: Some(duration_ms),
            ..Self::started(request_type, url)
        }
    }

    pub fn failed(request_type: &str, url: &str, error: &str, duration_ms: u64) -> Self {
        Self {
            status: NetworkStatus::Failed,
            error: Some(error.to_string()),
            duration_ms: Some(duration_ms),
            ..Self::started(request_type, url)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    ChildList,
    Attributes,
    CharacterData,
}

/// A DOM mutation under head or body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomMutation {
    /// Selector-ish description of the mutated node
    pub target: String,
    pub kind: MutationKind,
    pub added: usize,
    pub removed: usize,
    pub timestamp: u64,
}

/// A cross-frame message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameMessage {
    pub origin: String,
    pub data: Value,
    pub timestamp: u64,
}

impl FrameMessage {
    pub fn new(origin: impl Into<String>, data: Value) -> Self {
        Self {
            origin: origin.into(),
            data,
            timestamp: time::now_millis(),
        }
    }
}

/// Outcome of one hot reload, as seen on the bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HotReloadEntry {
    pub path: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_type: Option<ChangeType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: u64,
}
