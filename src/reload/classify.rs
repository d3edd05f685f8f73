//! Change Classification
//!
//! Pure function picking the cheapest safe reload strategy for a change.
//! No bus, no state.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::core::FileKind;

/// How a change is applied to the live preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    /// Swap the stylesheet in place
    Style,
    /// Re-execute the module
    Script,
    /// Replace the document
    Markup,
    /// Re-render the component, preserving state where possible
    Component,
}

impl ChangeType {
    pub fn name(self) -> &'static str {
        match self {
            Self::Style => "style",
            Self::Script => "script",
            Self::Markup => "markup",
            Self::Component => "component",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// `export function`, `export default class`, `export const` ...
static EXPORT_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bexport\s+(?:default\s+)?(?:async\s+)?(?:function|class|const|let)\b").unwrap()
});

/// `return <div`, `return (<>`, `=> <Item` ...
static MARKUP_RETURN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\breturn|=>)\s*\(?\s*<[A-Za-z>]").unwrap());

/// Classify a change, first match wins:
///
/// 1. stylesheet extension → [`ChangeType::Style`]
/// 2. markup extension → [`ChangeType::Markup`]
/// 3. source exporting a declaration that returns markup → [`ChangeType::Component`]
/// 4. anything else → [`ChangeType::Script`]
pub fn classify(path: &str, content: &str) -> ChangeType {
    match FileKind::from_path(path) {
        FileKind::Style => ChangeType::Style,
        FileKind::Markup => ChangeType::Markup,
        FileKind::Script | FileKind::Template if is_component(content) => ChangeType::Component,
        _ => ChangeType::Script,
    }
}

fn is_component(content: &str) -> bool {
    EXPORT_DECL.is_match(content) && MARKUP_RETURN.is_match(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_scenario() {
        let content = "export default function Foo() { return <div/>; }";
        assert_eq!(classify("/src/Foo.tsx", content), ChangeType::Component);
        assert_eq!(classify("/src/Foo.js", content), ChangeType::Component);
    }

    #[test]
    fn test_extension_wins() {
        let content = "export default function Foo() { return <div/>; }";
        assert_eq!(classify("/styles/site.css", content), ChangeType::Style);
        assert_eq!(classify("/index.html", content), ChangeType::Markup);
        assert_eq!(classify("/index.HTM", ""), ChangeType::Markup);
    }

    #[test]
    fn test_script_fallback() {
        assert_eq!(classify("/src/util.ts", "export const x = 1;"), ChangeType::Script);
        assert_eq!(classify("/src/View.tsx", "const v = () => <p/>;"), ChangeType::Script);
        assert_eq!(classify("/data.json", "{}"), ChangeType::Script);
        assert_eq!(classify("/README", "text"), ChangeType::Script);
    }

    #[test]
    fn test_arrow_and_parenthesized_returns() {
        let arrow = "export const Card = () => (\n  <section>hi</section>\n);";
        assert_eq!(classify("/components/Card.jsx", arrow), ChangeType::Component);

        let fragment = "export function List() {\n  return (\n    <>\n    </>\n  );\n}";
        assert_eq!(classify("/components/List.tsx", fragment), ChangeType::Component);
    }

    #[test]
    fn test_comparison_is_not_markup() {
        let content = "export function lt(a, b) { return a < b; }";
        assert_eq!(classify("/src/cmp.ts", content), ChangeType::Script);
    }
}
