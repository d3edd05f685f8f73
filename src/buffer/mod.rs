//! Code Buffer
//!
//! Holds the content of every opened file plus an "active" pointer, and
//! recomputes structural diagnostics on every change.
//!
//! Publishes `ContentChanged` on every update and `DiagnosticsPresent` only
//! when the fresh diagnostic list is non-empty.

mod check;

pub use check::{Diagnostic, DiagnosticSource, Severity, check};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::bus::{Event, EventBus};

/// Default number of lines on each side for [`CodeBuffer::surrounding_code`].
pub const DEFAULT_RADIUS: usize = 10;

#[derive(Debug, Clone, Default)]
struct BufferEntry {
    content: String,
    diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Default)]
struct BufferState {
    entries: FxHashMap<String, BufferEntry>,
    active: Option<String>,
}

/// A clipped window of lines around a position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeWindow {
    pub path: String,
    /// 1-based line number of `lines[0]`
    pub start_line: usize,
    pub lines: Vec<String>,
}

/// Open-file buffers with per-file diagnostics.
pub struct CodeBuffer {
    bus: EventBus,
    state: Mutex<BufferState>,
}

impl CodeBuffer {
    pub fn new(bus: EventBus) -> Self {
        Self {
            bus,
            state: Mutex::new(BufferState::default()),
        }
    }

    /// Mark `path` active, then [`update_file`](Self::update_file).
    pub fn set_active(&self, path: &str, content: &str) -> Vec<Diagnostic> {
        self.state.lock().active = Some(path.to_string());
        self.update_file(path, content)
    }

    /// Store `content` and recompute its diagnostics from scratch.
    pub fn update_file(&self, path: &str, content: &str) -> Vec<Diagnostic> {
        let diagnostics = check(content);

        self.state.lock().entries.insert(
            path.to_string(),
            BufferEntry {
                content: content.to_string(),
                diagnostics: diagnostics.clone(),
            },
        );

        crate::debug!("buffer"; "{}: {} diagnostic(s)", path, diagnostics.len());
        self.bus.publish(Event::ContentChanged {
            path: path.to_string(),
            content: content.to_string(),
        });
        if !diagnostics.is_empty() {
            self.bus.publish(Event::DiagnosticsPresent {
                path: path.to_string(),
                diagnostics: diagnostics.clone(),
            });
        }
        diagnostics
    }

    /// Splice `code` before the 0-based `line` (clipped), or append when `None`.
    ///
    /// Existing line terminators are kept; the inserted line uses CRLF when
    /// the content already does.
    pub fn insert_code(&self, path: &str, code: &str, line: Option<usize>) -> Vec<Diagnostic> {
        let current = self.content(path).unwrap_or_default();
        let eol = if current.contains("\r\n") { "\r\n" } else { "\n" };
        let lines: Vec<&str> = current.split_inclusive('\n').collect();

        let updated = match line {
            Some(line) if line < lines.len() => {
                let mut updated = String::with_capacity(current.len() + code.len() + eol.len());
                for (index, existing) in lines.iter().enumerate() {
                    if index == line {
                        updated.push_str(code);
                        updated.push_str(eol);
                    }
                    updated.push_str(existing);
                }
                updated
            }
            _ if current.is_empty() => code.to_string(),
            Some(_) if current.ends_with('\n') => format!("{current}{code}{eol}"),
            None if current.ends_with('\n') => format!("{current}{code}"),
            _ => format!("{current}{eol}{code}"),
        };

        self.update_file(path, &updated)
    }

    /// Lines around the 1-based `line` of the active file.
    pub fn surrounding_code(&self, line: usize, radius: Option<usize>) -> Option<CodeWindow> {
        let radius = radius.unwrap_or(DEFAULT_RADIUS);
        let state = self.state.lock();
        let path = state.active.as_ref()?;
        let entry = state.entries.get(path)?;

        let lines: Vec<&str> = entry.content.lines().collect();
        if lines.is_empty() {
            return Some(CodeWindow {
                path: path.clone(),
                start_line: 1,
                lines: Vec::new(),
            });
        }

        let line = line.clamp(1, lines.len());
        let start = line.saturating_sub(radius).max(1);
        let end = (line + radius).min(lines.len());

        Some(CodeWindow {
            path: path.clone(),
            start_line: start,
            lines: lines[start - 1..end].iter().map(|s| s.to_string()).collect(),
        })
    }

    pub fn content(&self, path: &str) -> Option<String> {
        self.state.lock().entries.get(path).map(|e| e.content.clone())
    }

    pub fn diagnostics(&self, path: &str) -> Vec<Diagnostic> {
        self.state
            .lock()
            .entries
            .get(path)
            .map(|e| e.diagnostics.clone())
            .unwrap_or_default()
    }

    pub fn active_path(&self) -> Option<String> {
        self.state.lock().active.clone()
    }

    /// Drop one buffer; clears the active pointer if it pointed there.
    pub fn remove(&self, path: &str) -> bool {
        let mut state = self.state.lock();
        if state.active.as_deref() == Some(path) {
            state.active = None;
        }
        state.entries.remove(path).is_some()
    }

    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.active = None;
    }
}
