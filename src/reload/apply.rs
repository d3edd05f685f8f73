//! Reload appliers.

use serde::Serialize;

use crate::bus::{Event, EventBus};

use super::ChangeType;

/// One classified change waiting to be applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReloadTask {
    pub path: String,
    pub content: String,
    pub change_type: ChangeType,
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
}

/// Applies a change to the live preview.
pub trait ReloadApplier: Send + Sync {
    fn apply(&self, task: &ReloadTask) -> anyhow::Result<()>;
}

/// Default applier: republishes the task on its `reload:apply-*` topic and
/// leaves the actual work to whoever subscribes there.
#[derive(Clone)]
pub struct BusApplier {
    bus: EventBus,
}

impl BusApplier {
    pub fn new(bus: EventBus) -> Self {
        Self { bus }
    }
}

impl ReloadApplier for BusApplier {
    fn apply(&self, task: &ReloadTask) -> anyhow::Result<()> {
        self.bus.publish(Event::ApplyChange(task.clone()));
        Ok(())
    }
}
