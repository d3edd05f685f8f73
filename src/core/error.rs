//! API misuse errors.
//!
//! Diagnostics and runtime failures never surface here; they travel over the
//! event bus and land in the triage history.

use thiserror::Error;

/// Errors returned to callers of the public API.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PreviewError {
    #[error("invalid project path `{0}`")]
    InvalidPath(String),
}

pub type Result<T, E = PreviewError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PreviewError::InvalidPath(String::new());
        assert_eq!(err.to_string(), "invalid project path ``");
    }
}
