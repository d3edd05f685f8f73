//! Configuration utility types.
//!
//! | Module  | Purpose                                          |
//! |---------|--------------------------------------------------|
//! | `error` | `ConfigError` and collected validation failures  |

mod error;

pub use error::{ConfigDiagnostic, ConfigDiagnostics, ConfigError};
