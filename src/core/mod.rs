//! Core types - pure abstractions shared across the codebase.

mod category;
mod error;
mod priority;

pub use category::FileKind;
pub use error::{PreviewError, Result};
pub use priority::Priority;
