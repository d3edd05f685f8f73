//! Import reference extraction.
//!
//! [`ImportScanner`] is the seam between "find the strings a file imports"
//! and "maintain the graph". The default [`RegexImportScanner`] is a
//! heuristic: it does no extension, alias or index-file resolution, and may
//! match references inside comments or strings.

use std::sync::LazyLock;

use regex::Regex;
use rustc_hash::FxHashSet;

use crate::utils::path::normalize_specifier;

/// Extracts import specifiers from file content.
pub trait ImportScanner: Send + Sync {
    /// Normalized, deduplicated specifiers in first-seen order.
    fn scan(&self, content: &str) -> Vec<String>;
}

/// Matches the three reference forms in source order:
/// - `import ... from "<p>"`
/// - `import("<p>")`
/// - `require("<p>")`
static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"\bimport\s+[^;'"]*?\bfrom\s*["']([^"']+)["']"#,
        r#"|\bimport\s*\(\s*["']([^"']+)["']\s*\)"#,
        r#"|\brequire\s*\(\s*["']([^"']+)["']\s*\)"#,
    ))
    .unwrap()
});

/// Default regex-based scanner.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegexImportScanner;

impl ImportScanner for RegexImportScanner {
    fn scan(&self, content: &str) -> Vec<String> {
        let mut seen = FxHashSet::default();
        let mut deps = Vec::new();

        for caps in IMPORT_RE.captures_iter(content) {
            let Some(spec) = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)) else {
                continue;
            };
            let normalized = normalize_specifier(spec.as_str());
            if seen.insert(normalized.clone()) {
                deps.push(normalized);
            }
        }

        deps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(content: &str) -> Vec<String> {
        RegexImportScanner.scan(content)
    }

    #[test]
    fn static_and_require_in_order() {
        let deps = scan(r#"import { a } from "./utils"; const b = require("../shared");"#);
        assert_eq!(deps, vec!["./utils", "../shared"]);
    }

    #[test]
    fn dynamic_import() {
        let deps = scan(r#"const Page = lazy(() => import('./pages/About'));"#);
        assert_eq!(deps, vec!["./pages/About"]);
    }

    #[test]
    fn deduplicates_first_seen() {
        let deps = scan(concat!(
            "import a from './a';\n",
            "import b from './b';\n",
            "const again = require('./a');\n",
        ));
        assert_eq!(deps, vec!["./a", "./b"]);
    }

    #[test]
    fn bare_specifiers_are_rooted() {
        let deps = scan(r#"import React from "react"; import x from "/lib/x";"#);
        assert_eq!(deps, vec!["/react", "/lib/x"]);
    }

    #[test]
    fn multiline_named_imports() {
        let deps = scan("import {\n  one,\n  two,\n} from \"./numbers\";\n");
        assert_eq!(deps, vec!["./numbers"]);
    }

    #[test]
    fn default_and_namespace_forms() {
        let deps = scan(concat!(
            "import * as path from 'path';\n",
            "import def, { named } from \"./mod\";\n",
        ));
        assert_eq!(deps, vec!["/path", "./mod"]);
    }

    #[test]
    fn no_references() {
        assert!(scan("const x = 1;\nexport default x;").is_empty());
        assert!(scan("").is_empty());
    }
}
