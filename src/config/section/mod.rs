//! Configuration section definitions.
//!
//! Each module corresponds to a section in `preview.toml`:
//!
//! | Module    | TOML Section | Purpose                                 |
//! |-----------|--------------|-----------------------------------------|
//! | `queue`   | `[queue]`    | Drain yield interval, per-task budget   |
//! | `triage`  | `[triage]`   | Error history size, similarity window   |
//! | `monitor` | `[monitor]`  | Debug log size, autostart               |
//! | `watch`   | `[watch]`    | CLI watcher root, debounce, ignores     |

mod monitor;
mod queue;
mod triage;
mod watch;

pub use monitor::MonitorConfig;
pub use queue::QueueConfig;
pub use triage::TriageConfig;
pub use watch::WatchConfig;
