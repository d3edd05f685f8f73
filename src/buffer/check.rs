//! Lightweight structural checks.
//!
//! Pure functions. Each call recomputes the full diagnostic list for a piece
//! of content; nothing is patched incrementally.

use std::fmt;

use serde::Serialize;

/// How bad a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// Which check produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSource {
    /// Bracket balance
    Syntax,
    /// Import statement shape
    Import,
    /// Anything else (host-provided linters)
    Lint,
}

/// A positioned message about file content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// 1-based
    pub line: usize,
    /// 1-based
    pub column: usize,
    pub message: String,
    pub severity: Severity,
    pub source: DiagnosticSource,
}

impl Diagnostic {
    pub fn error(line: usize, source: DiagnosticSource, message: impl Into<String>) -> Self {
        Self {
            line,
            column: 1,
            message: message.into(),
            severity: Severity::Error,
            source,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} {}", self.line, self.column, self.message)
    }
}

/// Run every check in order: braces, parentheses, import lines.
pub fn check(content: &str) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    diagnostics.extend(check_balance(content, '{', '}', "braces"));
    diagnostics.extend(check_balance(content, '(', ')', "parentheses"));
    diagnostics.extend(check_imports(content));
    diagnostics
}

/// One error at line 1 when the counts differ, regardless of by how much.
fn check_balance(content: &str, open: char, close: char, what: &str) -> Option<Diagnostic> {
    let opened = content.chars().filter(|&c| c == open).count();
    let closed = content.chars().filter(|&c| c == close).count();
    if opened == closed {
        return None;
    }

    Some(Diagnostic::error(
        1,
        DiagnosticSource::Syntax,
        format!("Unbalanced {what}: {opened} '{open}' vs {closed} '{close}'"),
    ))
}

/// Flag lines starting with `import` that lack `from`.
///
/// Dynamic `import(...)` calls are the only exemption. A multi-line
/// `import {` opener is flagged on its own line.
fn check_imports(content: &str) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for (index, line) in content.lines().enumerate() {
        let trimmed = line.trim_start();
        let Some(rest) = trimmed.strip_prefix("import") else {
            continue;
        };
        if rest.trim_start().starts_with('(') || has_from(trimmed) {
            continue;
        }

        diagnostics.push(Diagnostic {
            line: index + 1,
            column: line.len() - trimmed.len() + 1,
            message: "Malformed import statement: missing 'from' clause".to_string(),
            severity: Severity::Error,
            source: DiagnosticSource::Import,
        });
    }

    diagnostics
}

fn has_from(line: &str) -> bool {
    line.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .any(|word| word == "from")
}
