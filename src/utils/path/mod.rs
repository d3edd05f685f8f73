//! Project path utilities.
//!
//! Paths handled by the preview core are virtual project paths (`/src/App.tsx`),
//! not filesystem paths, so they stay plain strings. Pure functions, no side effects.

/// Lowercased extension of a project path, if any.
///
/// Only the last path segment is inspected, so `/a.b/file` has no extension.
pub fn extension(path: &str) -> Option<String> {
    let name = file_name(path);
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Last segment of a project path.
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Normalize an import specifier.
///
/// Relative specifiers (`./x`, `../x`) are kept as-is; everything else is
/// rooted with a leading `/` if it doesn't have one already.
pub fn normalize_specifier(spec: &str) -> String {
    if spec.starts_with("./") || spec.starts_with("../") || spec.starts_with('/') {
        spec.to_string()
    } else {
        format!("/{spec}")
    }
}

/// A project path is usable as a key when it is non-empty and has no NUL bytes.
pub fn is_valid(path: &str) -> bool {
    !path.trim().is_empty() && !path.contains('\0')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension() {
        assert_eq!(extension("/src/App.tsx").as_deref(), Some("tsx"));
        assert_eq!(extension("/styles/Main.CSS").as_deref(), Some("css"));
        assert_eq!(extension("/a.b/file"), None);
        assert_eq!(extension("/.env"), None);
        assert_eq!(extension("Makefile"), None);
    }

    #[test]
    fn test_normalize_specifier() {
        assert_eq!(normalize_specifier("./utils"), "./utils");
        assert_eq!(normalize_specifier("../shared"), "../shared");
        assert_eq!(normalize_specifier("/lib/x"), "/lib/x");
        assert_eq!(normalize_specifier("react"), "/react");
    }

    #[test]
    fn test_is_valid() {
        assert!(is_valid("/a.ts"));
        assert!(!is_valid(""));
        assert!(!is_valid("   "));
        assert!(!is_valid("/a\0b"));
    }
}
