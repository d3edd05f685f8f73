//! Panic isolation helpers.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

/// Run `f`, converting a panic into its message.
///
/// Used at every boundary where host-supplied code runs (bus handlers,
/// reload appliers, environment probes) so one failure can't take down
/// the caller's loop.
pub fn guard<R>(f: impl FnOnce() -> R) -> Result<R, String> {
    catch_unwind(AssertUnwindSafe(f)).map_err(|payload| message(payload.as_ref()))
}

/// Extract a readable message from a panic payload.
pub fn message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_ok() {
        assert_eq!(guard(|| 1 + 1), Ok(2));
    }

    #[test]
    fn test_guard_panic_message() {
        let result: Result<(), String> = guard(|| panic!("boom {}", 7));
        assert_eq!(result, Err("boom 7".to_string()));
    }
}
