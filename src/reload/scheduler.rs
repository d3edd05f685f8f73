//! Reload Scheduler
//!
//! Strict FIFO queue of classified changes. Each task walks:
//!
//! ```text
//! Queued ──► Applying ──► Succeeded ──► Restoring   (component with snapshot)
//!                    └──► Failed
//! ```

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::build::{BuildTask, TaskSink};
use crate::bus::{Event, EventBus};
use crate::config::QueueConfig;
use crate::utils::{panic::guard, time};

use super::apply::{BusApplier, ReloadApplier, ReloadTask};
use super::state::{NoopPreserver, PreservedState, StatePreserver};
use super::{ChangeType, classify};

/// Last known state of the most recent task for a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Queued,
    Applying,
    Succeeded,
    Failed,
    Restoring,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReloadStats {
    pub applied: u64,
    pub failed: u64,
    pub restored: u64,
}

pub struct ReloadScheduler {
    bus: EventBus,
    applier: Arc<dyn ReloadApplier>,
    preserver: Arc<dyn StatePreserver>,
    queue: Mutex<VecDeque<ReloadTask>>,
    snapshots: Mutex<FxHashMap<String, PreservedState>>,
    states: Mutex<FxHashMap<String, TaskState>>,
    stats: Mutex<ReloadStats>,
    draining: AtomicBool,
    yield_every: usize,
}

impl ReloadScheduler {
    /// Scheduler with the bus applier and no state preservation.
    pub fn new(bus: EventBus, config: &QueueConfig) -> Self {
        let applier = Arc::new(BusApplier::new(bus.clone()));
        Self::with_parts(bus, applier, Arc::new(NoopPreserver), config)
    }

    pub fn with_parts(
        bus: EventBus,
        applier: Arc<dyn ReloadApplier>,
        preserver: Arc<dyn StatePreserver>,
        config: &QueueConfig,
    ) -> Self {
        Self {
            bus,
            applier,
            preserver,
            queue: Mutex::new(VecDeque::new()),
            snapshots: Mutex::new(FxHashMap::default()),
            states: Mutex::new(FxHashMap::default()),
            stats: Mutex::new(ReloadStats::default()),
            draining: AtomicBool::new(false),
            yield_every: config.yield_every.max(1),
        }
    }

    /// Classify, snapshot (components only), enqueue, and drain if idle.
    pub fn process_change(&self, path: &str, content: &str) -> ChangeType {
        let change_type = classify(path, content);

        if change_type == ChangeType::Component {
            self.capture(path);
        }

        self.queue.lock().push_back(ReloadTask {
            path: path.to_string(),
            content: content.to_string(),
            change_type,
            timestamp: time::now_millis(),
        });
        self.set_state(path, TaskState::Queued);
        crate::debug!("reload"; "queued {} as {}", path, change_type);

        self.drain();
        change_type
    }

    /// Drop the snapshot held for `path`.
    pub fn discard_state(&self, path: &str) -> bool {
        self.snapshots.lock().remove(path).is_some()
    }

    pub fn has_snapshot(&self, path: &str) -> bool {
        self.snapshots.lock().contains_key(path)
    }

    pub fn state(&self, path: &str) -> Option<TaskState> {
        self.states.lock().get(path).copied()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    pub fn stats(&self) -> ReloadStats {
        *self.stats.lock()
    }

    /// Drop queued tasks and all snapshots.
    pub fn clear(&self) {
        self.queue.lock().clear();
        self.snapshots.lock().clear();
        self.states.lock().clear();
    }

    // -------------------------------------------------------------------------
    // Drain
    // -------------------------------------------------------------------------

    fn drain(&self) {
        loop {
            if self.draining.swap(true, Ordering::AcqRel) {
                return;
            }

            let mut processed = 0usize;
            loop {
                let next = self.queue.lock().pop_front();
                let Some(task) = next else { break };
                self.run(task);
                processed += 1;
                if processed % self.yield_every == 0 {
                    std::thread::yield_now();
                }
            }

            self.draining.store(false, Ordering::Release);
            if self.queue.lock().is_empty() {
                return;
            }
        }
    }

    fn run(&self, task: ReloadTask) {
        self.set_state(&task.path, TaskState::Applying);

        let failure = match guard(|| self.applier.apply(&task)) {
            Ok(Ok(())) => None,
            Ok(Err(err)) => Some(format!("{err:#}")),
            Err(panic) => Some(format!("applier panicked: {panic}")),
        };

        if let Some(error) = failure {
            self.set_state(&task.path, TaskState::Failed);
            self.stats.lock().failed += 1;
            crate::log!("reload"; "{} failed: {}", task.path, error);
            self.bus.publish(Event::HotReloadError {
                path: task.path,
                error,
            });
            return;
        }

        self.set_state(&task.path, TaskState::Succeeded);
        self.stats.lock().applied += 1;

        if task.change_type == ChangeType::Component {
            self.restore(&task.path);
        }

        self.bus.publish(Event::HotReloadSuccess {
            path: task.path,
            change_type: task.change_type,
        });
    }

    fn capture(&self, path: &str) {
        match guard(|| self.preserver.capture(path)) {
            Ok(Some(snapshot)) => {
                self.snapshots.lock().insert(path.to_string(), snapshot);
            }
            Ok(None) => {}
            Err(panic) => crate::log!("reload"; "state capture for {} panicked: {}", path, panic),
        }
    }

    /// Restore then discard the snapshot; best effort.
    fn restore(&self, path: &str) {
        let Some(snapshot) = self.snapshots.lock().remove(path) else {
            return;
        };

        self.set_state(path, TaskState::Restoring);
        match guard(|| self.preserver.restore(&snapshot)) {
            Ok(Ok(())) => self.stats.lock().restored += 1,
            Ok(Err(err)) => crate::log!("reload"; "state restore for {} failed: {:#}", path, err),
            Err(panic) => crate::log!("reload"; "state restore for {} panicked: {}", path, panic),
        }
    }

    fn set_state(&self, path: &str, state: TaskState) {
        self.states.lock().insert(path.to_string(), state);
    }
}

impl TaskSink for ReloadScheduler {
    fn dispatch(&self, task: &BuildTask) -> anyhow::Result<()> {
        self.process_change(&task.path, &task.content);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::Topic;
    use crate::reload::MemoryPreserver;
    use serde_json::json;

    fn collect(bus: &EventBus, topics: &[Topic]) -> Arc<Mutex<Vec<Event>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        for &topic in topics {
            let sink = Arc::clone(&events);
            bus.subscribe(topic, move |e| sink.lock().push(e.clone()));
        }
        events
    }

    const COMPONENT: &str = "export default function Foo() { return <div/>; }";

    #[test]
    fn test_apply_topic_per_change_type() {
        let bus = EventBus::new();
        let scheduler = ReloadScheduler::new(bus.clone(), &QueueConfig::default());
        let applied = collect(
            &bus,
            &[Topic::ApplyStyle, Topic::ApplyScript, Topic::ApplyMarkup, Topic::ApplyComponent],
        );

        scheduler.process_change("/a.css", "a {}");
        scheduler.process_change("/b.ts", "let b;");
        scheduler.process_change("/c.html", "<p></p>");
        scheduler.process_change("/D.tsx", COMPONENT);

        let topics: Vec<Topic> = applied.lock().iter().map(Event::topic).collect();
        assert_eq!(
            topics,
            vec![Topic::ApplyStyle, Topic::ApplyScript, Topic::ApplyMarkup, Topic::ApplyComponent]
        );
        assert_eq!(scheduler.state("/D.tsx"), Some(TaskState::Succeeded));
    }

    #[test]
    fn test_fifo_with_reentrant_changes() {
        let bus = EventBus::new();
        let scheduler = Arc::new(ReloadScheduler::new(bus.clone(), &QueueConfig::default()));
        let order = collect(&bus, &[Topic::HotReloadSuccess]);

        let weak = Arc::downgrade(&scheduler);
        bus.subscribe(Topic::ApplyScript, move |e| {
            if let Event::ApplyChange(task) = e
                && task.path == "/first.ts"
                && let Some(scheduler) = weak.upgrade()
            {
                scheduler.process_change("/late.ts", "");
            }
        });

        scheduler.process_change("/first.ts", "");
        let paths: Vec<String> = order
            .lock()
            .iter()
            .filter_map(|e| match e {
                Event::HotReloadSuccess { path, .. } => Some(path.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(paths, vec!["/first.ts", "/late.ts"]);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_applier_failure_reported_and_loop_continues() {
        struct Picky;
        impl ReloadApplier for Picky {
            fn apply(&self, task: &ReloadTask) -> anyhow::Result<()> {
                match task.path.as_str() {
                    "/bad.ts" => anyhow::bail!("cannot apply"),
                    "/worse.ts" => panic!("exploded"),
                    _ => Ok(()),
                }
            }
        }

        crate::logger::set_quiet(true);
        let bus = EventBus::new();
        let scheduler = ReloadScheduler::with_parts(
            bus.clone(),
            Arc::new(Picky),
            Arc::new(NoopPreserver),
            &QueueConfig::default(),
        );
        let events = collect(&bus, &[Topic::HotReloadSuccess, Topic::HotReloadError]);

        scheduler.process_change("/bad.ts", "");
        scheduler.process_change("/worse.ts", "");
        scheduler.process_change("/good.ts", "");

        let events = events.lock();
        assert_eq!(events.len(), 3);
        match &events[0] {
            Event::HotReloadError { path, error } => {
                assert_eq!(path, "/bad.ts");
                assert_eq!(error, "cannot apply");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(&events[1], Event::HotReloadError { error, .. } if error.contains("exploded")));
        assert_eq!(events[2].topic(), Topic::HotReloadSuccess);
        assert_eq!(scheduler.state("/bad.ts"), Some(TaskState::Failed));
        assert_eq!(scheduler.stats(), ReloadStats { applied: 1, failed: 2, restored: 0 });
    }

    #[test]
    fn test_component_state_restored_after_success() {
        let bus = EventBus::new();
        let preserver = Arc::new(MemoryPreserver::new());
        let scheduler = ReloadScheduler::with_parts(
            bus.clone(),
            Arc::new(BusApplier::new(bus.clone())),
            Arc::clone(&preserver) as Arc<dyn StatePreserver>,
            &QueueConfig::default(),
        );

        // the reload itself wipes the component's state
        let wiper = Arc::clone(&preserver);
        bus.subscribe(Topic::ApplyComponent, move |e| {
            if let Event::ApplyChange(task) = e {
                wiper.forget(&task.path);
            }
        });

        preserver.set("/Foo.tsx", json!({ "open": true }));
        scheduler.process_change("/Foo.tsx", COMPONENT);

        assert_eq!(preserver.get("/Foo.tsx"), Some(json!({ "open": true })));
        assert_eq!(preserver.restored(), vec!["/Foo.tsx"]);
        assert!(!scheduler.has_snapshot("/Foo.tsx"));
        assert_eq!(scheduler.state("/Foo.tsx"), Some(TaskState::Restoring));
    }

    #[test]
    fn test_scripts_are_not_snapshotted() {
        let bus = EventBus::new();
        let preserver = Arc::new(MemoryPreserver::new());
        let scheduler = ReloadScheduler::with_parts(
            bus.clone(),
            Arc::new(BusApplier::new(bus)),
            Arc::clone(&preserver) as Arc<dyn StatePreserver>,
            &QueueConfig::default(),
        );

        preserver.set("/util.ts", json!(1));
        scheduler.process_change("/util.ts", "export const x = 1;");
        assert!(preserver.restored().is_empty());
    }

    #[test]
    fn test_failed_component_keeps_snapshot_until_discarded() {
        struct Failing;
        impl ReloadApplier for Failing {
            fn apply(&self, _: &ReloadTask) -> anyhow::Result<()> {
                anyhow::bail!("nope")
            }
        }

        crate::logger::set_quiet(true);
        let bus = EventBus::new();
        let preserver = Arc::new(MemoryPreserver::new());
        preserver.set("/Foo.tsx", json!("kept"));
        let scheduler = ReloadScheduler::with_parts(
            bus,
            Arc::new(Failing),
            Arc::clone(&preserver) as Arc<dyn StatePreserver>,
            &QueueConfig::default(),
        );

        scheduler.process_change("/Foo.tsx", COMPONENT);
        assert!(scheduler.has_snapshot("/Foo.tsx"));
        assert!(scheduler.discard_state("/Foo.tsx"));
        assert!(!scheduler.discard_state("/Foo.tsx"));
    }

    #[test]
    fn test_build_queue_sink() {
        let bus = EventBus::new();
        let scheduler = Arc::new(ReloadScheduler::new(bus.clone(), &QueueConfig::default()));
        let applied = collect(&bus, &[Topic::ApplyStyle]);

        let queue = crate::build::BuildQueue::new(
            bus,
            Arc::clone(&scheduler) as Arc<dyn TaskSink>,
            &QueueConfig::default(),
        );
        queue.live_update("/site.css", "body {}");
        assert_eq!(applied.lock().len(), 1);
    }
}
