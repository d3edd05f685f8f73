//! Canned recovery hints, one strategy per category.

use serde::Serialize;

use super::ErrorCategory;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecoveryHint {
    pub title: &'static str,
    pub steps: &'static [&'static str],
}

const SYNTAX: RecoveryHint = RecoveryHint {
    title: "Fix the syntax error",
    steps: &[
        "Check that every brace, bracket and parenthesis is closed",
        "Look for a missing comma or semicolon near the reported line",
        "Make sure import statements have a `from` clause",
    ],
};

const RUNTIME: RecoveryHint = RecoveryHint {
    title: "Inspect the runtime failure",
    steps: &[
        "Open the file named in the stack trace at the reported line",
        "Check the values flowing into the failing call",
        "Reload the preview once the cause is fixed",
    ],
};

const IMPORT: RecoveryHint = RecoveryHint {
    title: "Resolve the import",
    steps: &[
        "Verify the imported file exists at the given path",
        "Check relative path prefixes (`./`, `../`)",
        "Confirm the imported name is exported by that module",
    ],
};

const TYPE: RecoveryHint = RecoveryHint {
    title: "Check value types",
    steps: &[
        "Guard against `undefined` or `null` before property access",
        "Confirm the value is callable before calling it",
    ],
};

const OTHER: RecoveryHint = RecoveryHint {
    title: "Review the reported problem",
    steps: &["Read the message and the surrounding code for context"],
};

/// The hint for `category`.
pub fn for_category(category: ErrorCategory) -> RecoveryHint {
    match category {
        ErrorCategory::Syntax => SYNTAX,
        ErrorCategory::Runtime => RUNTIME,
        ErrorCategory::Import => IMPORT,
        ErrorCategory::Type => TYPE,
        ErrorCategory::Other => OTHER,
    }
}
