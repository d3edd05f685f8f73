//! Error records and classification.

use std::fmt;

use serde::Serialize;

use crate::buffer::{Diagnostic, DiagnosticSource, Severity};
use crate::build::RuntimeError;

use super::hint::RecoveryHint;

/// Error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Syntax,
    Runtime,
    Import,
    Type,
    Other,
}

impl ErrorCategory {
    pub const ALL: [Self; 5] = [
        Self::Syntax,
        Self::Runtime,
        Self::Import,
        Self::Type,
        Self::Other,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Syntax => "syntax",
            Self::Runtime => "runtime",
            Self::Import => "import",
            Self::Type => "type",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Any error the triage accepts: static diagnostics and runtime reports.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TrackedError {
    pub message: String,
    /// File the error points at
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    /// Present only for errors that came out of the code buffer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<DiagnosticSource>,
}

impl TrackedError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn from_diagnostic(path: &str, diagnostic: &Diagnostic) -> Self {
        Self {
            message: diagnostic.message.clone(),
            path: Some(path.to_string()),
            line: u32::try_from(diagnostic.line).ok(),
            column: u32::try_from(diagnostic.column).ok(),
            stack: None,
            severity: Some(diagnostic.severity),
            origin: Some(diagnostic.source),
        }
    }

    /// Category by precedence: diagnostic origin first, then message keywords.
    pub fn classify(&self) -> ErrorCategory {
        if self.severity.is_some() {
            return match self.origin {
                Some(DiagnosticSource::Syntax) => ErrorCategory::Syntax,
                Some(DiagnosticSource::Import) => ErrorCategory::Import,
                _ => ErrorCategory::Other,
            };
        }

        let message = self.message.to_lowercase();
        if message.contains("import") || message.contains("module") {
            ErrorCategory::Import
        } else if message.contains("type") || message.contains("undefined") {
            ErrorCategory::Type
        } else if message.contains("syntax") {
            ErrorCategory::Syntax
        } else {
            ErrorCategory::Runtime
        }
    }

    /// Case-insensitive containment either way round. Blank messages are
    /// never similar to anything.
    pub fn is_similar(&self, other: &str) -> bool {
        let a = self.message.trim().to_lowercase();
        let b = other.trim().to_lowercase();
        if a.is_empty() || b.is_empty() {
            return false;
        }
        a.contains(&b) || b.contains(&a)
    }
}

impl From<RuntimeError> for TrackedError {
    fn from(err: RuntimeError) -> Self {
        Self {
            message: err.message,
            path: err.source,
            line: err.line,
            column: err.column,
            stack: err.stack,
            severity: None,
            origin: None,
        }
    }
}

/// One entry in the error history. Only `resolved` ever changes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorRecord {
    pub id: u64,
    pub error: TrackedError,
    pub category: ErrorCategory,
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
    pub resolved: bool,
    pub hint: RecoveryHint,
}

/// Published on `error:diagnose` for every handled error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnoseReport {
    pub error: TrackedError,
    pub category: ErrorCategory,
    pub hint: RecoveryHint,
    /// Earlier records with a similar message
    pub recent_similar_count: usize,
    /// Similar records, this one included, inside the frequency window
    pub frequency_last_5min: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_origin_takes_precedence() {
        let diagnostic = Diagnostic::error(1, DiagnosticSource::Syntax, "Malformed import statement");
        let error = TrackedError::from_diagnostic("/a.ts", &diagnostic);
        // message mentions "import", origin still wins
        assert_eq!(error.classify(), ErrorCategory::Syntax);

        let lint = Diagnostic::error(1, DiagnosticSource::Lint, "type mismatch");
        assert_eq!(
            TrackedError::from_diagnostic("/a.ts", &lint).classify(),
            ErrorCategory::Other
        );

        let import = Diagnostic::error(3, DiagnosticSource::Import, "missing from");
        assert_eq!(
            TrackedError::from_diagnostic("/a.ts", &import).classify(),
            ErrorCategory::Import
        );
    }

    #[test]
    fn test_message_keywords() {
        let cases = [
            ("Cannot find module './x'", ErrorCategory::Import),
            ("Failed to IMPORT thing", ErrorCategory::Import),
            ("TypeError: x is not a function", ErrorCategory::Type),
            ("Cannot read properties of undefined", ErrorCategory::Type),
            ("SyntaxError: Unexpected token", ErrorCategory::Syntax),
            ("SyntaxError: undefined label", ErrorCategory::Type),
            ("Unexpected syntax near line 4", ErrorCategory::Syntax),
            ("Maximum call stack size exceeded", ErrorCategory::Runtime),
        ];
        for (message, expected) in cases {
            assert_eq!(TrackedError::new(message).classify(), expected, "{message}");
        }
    }

    #[test]
    fn test_from_runtime_error() {
        let runtime = RuntimeError::new("boom").with_source("/a.ts").with_position(3, 7);
        let error = TrackedError::from(runtime);
        assert_eq!(error.path.as_deref(), Some("/a.ts"));
        assert_eq!((error.line, error.column), (Some(3), Some(7)));
        assert!(error.severity.is_none());
    }

    #[test]
    fn test_similarity_is_symmetric_containment() {
        let error = TrackedError::new("x is not defined");
        assert!(error.is_similar("X IS NOT DEFINED"));
        assert!(error.is_similar("ReferenceError: x is not defined"));
        assert!(error.is_similar("not defined"));
        assert!(!error.is_similar("y is undefined"));
        assert!(!error.is_similar(""));
        assert!(!TrackedError::new(" ").is_similar("x is not defined"));
    }
}
