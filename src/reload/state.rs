//! State preservation across component reloads.
//!
//! A [`StatePreserver`] captures a snapshot of whatever transient UI state a
//! component holds before it is reloaded, and puts it back afterwards. Hosts
//! without a way to reach that state use [`NoopPreserver`].

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::Serialize;
use serde_json::Value;

use crate::utils::time;

/// Opaque snapshot for one path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreservedState {
    pub path: String,
    pub data: Value,
    pub captured_at: u64,
}

impl PreservedState {
    pub fn new(path: &str, data: Value) -> Self {
        Self {
            path: path.to_string(),
            data,
            captured_at: time::now_millis(),
        }
    }
}

/// Capture/restore capability.
pub trait StatePreserver: Send + Sync {
    /// Snapshot the state behind `path`, if any.
    fn capture(&self, path: &str) -> Option<PreservedState>;

    /// Put a snapshot back after a successful reload.
    fn restore(&self, state: &PreservedState) -> anyhow::Result<()>;
}

/// Captures nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPreserver;

impl StatePreserver for NoopPreserver {
    fn capture(&self, _path: &str) -> Option<PreservedState> {
        None
    }

    fn restore(&self, _state: &PreservedState) -> anyhow::Result<()> {
        Ok(())
    }
}

/// In-memory key/value state, keyed by path.
///
/// `set` plays the role of the running component writing its state; a reload
/// that loses the state can be simulated with `forget`.
#[derive(Debug, Default)]
pub struct MemoryPreserver {
    live: Mutex<FxHashMap<String, Value>>,
    restores: Mutex<Vec<String>>,
}

impl MemoryPreserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, path: &str, value: Value) {
        self.live.lock().insert(path.to_string(), value);
    }

    pub fn get(&self, path: &str) -> Option<Value> {
        self.live.lock().get(path).cloned()
    }

    pub fn forget(&self, path: &str) {
        self.live.lock().remove(path);
    }

    /// Paths restored so far, in order.
    pub fn restored(&self) -> Vec<String> {
        self.restores.lock().clone()
    }
}

impl StatePreserver for MemoryPreserver {
    fn capture(&self, path: &str) -> Option<PreservedState> {
        self.get(path).map(|data| PreservedState::new(path, data))
    }

    fn restore(&self, state: &PreservedState) -> anyhow::Result<()> {
        self.set(&state.path, state.data.clone());
        self.restores.lock().push(state.path.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_noop_captures_nothing() {
        assert!(NoopPreserver.capture("/a.tsx").is_none());
    }

    #[test]
    fn test_memory_round_trip() {
        let preserver = MemoryPreserver::new();
        assert!(preserver.capture("/a.tsx").is_none());

        preserver.set("/a.tsx", json!({ "count": 3 }));
        let snapshot = preserver.capture("/a.tsx").unwrap();
        preserver.forget("/a.tsx");

        preserver.restore(&snapshot).unwrap();
        assert_eq!(preserver.get("/a.tsx"), Some(json!({ "count": 3 })));
        assert_eq!(preserver.restored(), vec!["/a.tsx"]);
    }
}
