//! Priority levels for preview updates.

use std::fmt;

use serde::Serialize;

use super::FileKind;

/// Path fragments that mark an application entry point.
const ENTRY_MARKERS: &[&str] = &["index.", "main.", "App."];

/// Priority of a pending preview update.
///
/// Higher value = processed first. Values are the numeric weights the build
/// queue sorts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "u8")]
pub enum Priority {
    /// Anything without a better match
    Default = 20,
    /// Stylesheet outside the directories below
    Stylesheet = 40,
    /// File under a components directory
    Component = 60,
    /// Routed page
    Page = 80,
    /// Application entry point - highest priority
    Entry = 100,
}

impl Priority {
    /// Derive priority from a project path. First match wins.
    pub fn for_path(path: &str) -> Self {
        if ENTRY_MARKERS.iter().any(|marker| path.contains(marker)) {
            Self::Entry
        } else if path.contains("pages/") || path.contains("page.") {
            Self::Page
        } else if path.contains("components/") {
            Self::Component
        } else if FileKind::from_path(path) == FileKind::Style {
            Self::Stylesheet
        } else {
            Self::Default
        }
    }

    #[inline]
    pub fn value(self) -> u8 {
        self as u8
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        priority.value()
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::Entry > Priority::Page);
        assert!(Priority::Page > Priority::Component);
        assert!(Priority::Component > Priority::Stylesheet);
        assert!(Priority::Stylesheet > Priority::Default);
    }

    #[test]
    fn test_for_path_first_match_wins() {
        assert_eq!(Priority::for_path("/src/index.ts"), Priority::Entry);
        assert_eq!(Priority::for_path("/src/App.tsx"), Priority::Entry);
        // entry marker beats the pages directory
        assert_eq!(Priority::for_path("/src/pages/index.tsx"), Priority::Entry);
        assert_eq!(Priority::for_path("/src/pages/about.tsx"), Priority::Page);
        assert_eq!(Priority::for_path("/app/settings/page.tsx"), Priority::Page);
        assert_eq!(Priority::for_path("/src/components/Button.tsx"), Priority::Component);
        assert_eq!(Priority::for_path("/src/components/button.css"), Priority::Component);
        assert_eq!(Priority::for_path("/styles/theme.css"), Priority::Stylesheet);
        assert_eq!(Priority::for_path("/src/utils/date.ts"), Priority::Default);
    }

    #[test]
    fn test_value() {
        assert_eq!(Priority::Entry.value(), 100);
        assert_eq!(Priority::Default.value(), 20);
    }
}
