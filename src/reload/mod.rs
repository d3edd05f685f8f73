//! Hot Reload
//!
//! Classifies each change, applies it through a [`ReloadApplier`] in strict
//! arrival order, and carries component state across the reload through a
//! [`StatePreserver`].
//!
//! # Module Structure
//!
//! ```text
//! reload/
//! ├── classify.rs   # ChangeType + classify() (pure)
//! ├── apply.rs      # ReloadTask, ReloadApplier, BusApplier
//! ├── state.rs      # StatePreserver, NoopPreserver, MemoryPreserver
//! └── scheduler.rs  # ReloadScheduler (FIFO drain, snapshot lifecycle)
//! ```

mod apply;
mod classify;
mod scheduler;
mod state;

pub use apply::{BusApplier, ReloadApplier, ReloadTask};
pub use classify::{ChangeType, classify};
pub use scheduler::{ReloadScheduler, ReloadStats, TaskState};
pub use state::{MemoryPreserver, NoopPreserver, PreservedState, StatePreserver};
