//! File kind definitions.

use serde::Serialize;

use crate::utils::path::extension;

/// Kind of a project file, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// Plain script module (.js, .ts, ...)
    Script,
    /// View template that may render markup (.jsx, .tsx, .vue, .svelte)
    Template,
    /// Stylesheet (.css, .scss, .sass, .less)
    Style,
    /// Markup document (.html, .htm)
    Markup,
    /// Structured data (.json, .md, .yaml, .toml)
    Data,
    /// Binary or media asset
    Asset,
    /// Anything else
    Other,
}

impl FileKind {
    /// Detect file kind from a (lowercase) extension.
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            "js" | "mjs" | "cjs" | "ts" | "mts" | "cts" => Self::Script,
            "jsx" | "tsx" | "vue" | "svelte" | "astro" => Self::Template,
            "css" | "scss" | "sass" | "less" => Self::Style,
            "html" | "htm" => Self::Markup,
            "json" | "md" | "markdown" | "yaml" | "yml" | "toml" => Self::Data,
            "png" | "jpg" | "jpeg" | "gif" | "webp" | "svg" | "ico" | "woff" | "woff2" => {
                Self::Asset
            }
            _ => Self::Other,
        }
    }

    /// Detect file kind from a project path.
    pub fn from_path(path: &str) -> Self {
        extension(path)
            .map(|ext| Self::from_extension(&ext))
            .unwrap_or(Self::Other)
    }

    /// Whether files of this kind can carry import statements.
    pub fn is_source(self) -> bool {
        matches!(self, Self::Script | Self::Template | Self::Markup)
    }

    /// Display name for this kind.
    pub fn name(self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Template => "template",
            Self::Style => "style",
            Self::Markup => "markup",
            Self::Data => "data",
            Self::Asset => "asset",
            Self::Other => "other",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path() {
        assert_eq!(FileKind::from_path("/src/main.ts"), FileKind::Script);
        assert_eq!(FileKind::from_path("/src/App.tsx"), FileKind::Template);
        assert_eq!(FileKind::from_path("/src/Card.vue"), FileKind::Template);
        assert_eq!(FileKind::from_path("/styles/site.SCSS"), FileKind::Style);
        assert_eq!(FileKind::from_path("/index.html"), FileKind::Markup);
        assert_eq!(FileKind::from_path("/package.json"), FileKind::Data);
        assert_eq!(FileKind::from_path("/logo.svg"), FileKind::Asset);
        assert_eq!(FileKind::from_path("/LICENSE"), FileKind::Other);
    }

    #[test]
    fn test_is_source() {
        assert!(FileKind::Script.is_source());
        assert!(FileKind::Template.is_source());
        assert!(!FileKind::Style.is_source());
        assert!(!FileKind::Data.is_source());
    }
}
