//! Build Queue
//!
//! Priority-ordered queue of pending preview updates, drained to completion
//! once started.
//!
//! ```text
//! live_update ──► [sorted tasks] ──drain──► TaskSink (reload scheduler)
//!                                    │
//!                                    ├─ ok      → PreviewUpdate
//!                                    ├─ failure → RuntimeError + DiagnoseRequest
//!                                    └─ cancel  → BuildCancelled
//! ```
//!
//! Tasks enqueued while a drain is running are picked up by that same drain.
//! Every task ends in exactly one outcome.

mod cancel;
mod runtime;

pub use cancel::CancelToken;
pub use runtime::{ConsoleEntry, ConsoleLevel, RuntimeError};

use std::cmp::Reverse;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;

use crate::bus::{Event, EventBus};
use crate::config::QueueConfig;
use crate::core::Priority;
use crate::utils::{panic::guard, time};

// =============================================================================
// Task
// =============================================================================

/// One pending preview update.
#[derive(Debug, Clone)]
pub struct BuildTask {
    pub path: String,
    pub content: String,
    pub priority: Priority,
    /// Arrival order, breaks priority ties
    pub sequence: u64,
    token: CancelToken,
}

impl BuildTask {
    pub fn token(&self) -> &CancelToken {
        &self.token
    }
}

/// Lightweight view of a queued task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingTask {
    pub path: String,
    pub priority: Priority,
    pub sequence: u64,
}

/// Receives tasks popped from the queue.
pub trait TaskSink: Send + Sync {
    fn dispatch(&self, task: &BuildTask) -> anyhow::Result<()>;
}

// =============================================================================
// Queue
// =============================================================================

/// Counters for debug output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub succeeded: u64,
    pub failed: u64,
    pub cancelled: u64,
    pub slow: u64,
}

pub struct BuildQueue {
    bus: EventBus,
    sink: Arc<dyn TaskSink>,
    tasks: Mutex<Vec<BuildTask>>,
    draining: AtomicBool,
    sequence: AtomicU64,
    stats: Mutex<QueueStats>,
    yield_every: usize,
    budget: Duration,
}

impl BuildQueue {
    pub fn new(bus: EventBus, sink: Arc<dyn TaskSink>, config: &QueueConfig) -> Self {
        Self {
            bus,
            sink,
            tasks: Mutex::new(Vec::new()),
            draining: AtomicBool::new(false),
            sequence: AtomicU64::new(0),
            stats: Mutex::new(QueueStats::default()),
            yield_every: config.yield_every.max(1),
            budget: Duration::from_millis(config.task_budget_ms),
        }
    }

    /// Queue a preview update for `path` and drain if idle.
    ///
    /// Returns the task's cancellation token.
    pub fn live_update(&self, path: &str, content: &str) -> CancelToken {
        let token = self.enqueue(path, content, Priority::for_path(path));
        self.drain();
        token
    }

    /// Queue without draining. Used to batch several updates.
    pub fn enqueue(&self, path: &str, content: &str, priority: Priority) -> CancelToken {
        let token = CancelToken::new();
        let task = BuildTask {
            path: path.to_string(),
            content: content.to_string(),
            priority,
            sequence: self.sequence.fetch_add(1, Ordering::Relaxed),
            token: token.clone(),
        };

        let mut tasks = self.tasks.lock();
        tasks.push(task);
        // stable: equal priorities keep arrival order
        tasks.sort_by_key(|t| Reverse(t.priority));
        crate::debug!("queue"; "queued {} (priority {}, {} pending)", path, priority, tasks.len());
        token
    }

    /// Process queued tasks until the queue is empty.
    ///
    /// No-op if a drain is already running further up the stack.
    pub fn drain(&self) {
        loop {
            if self.draining.swap(true, Ordering::AcqRel) {
                return;
            }

            let mut processed = 0usize;
            while let Some(task) = self.pop() {
                self.run(task);
                processed += 1;
                if processed % self.yield_every == 0 {
                    std::thread::yield_now();
                }
            }

            self.draining.store(false, Ordering::Release);

            // A task may have slipped in between the last pop and the release
            if self.tasks.lock().is_empty() {
                return;
            }
        }
    }

    /// Cancel every queued task for `path`. Returns how many were cancelled.
    pub fn cancel(&self, path: &str) -> usize {
        let tasks = self.tasks.lock();
        let mut count = 0;
        for task in tasks.iter().filter(|t| t.path == path) {
            task.token.cancel();
            count += 1;
        }
        count
    }

    /// Normalize a preview-reported error and broadcast it.
    pub fn handle_runtime_error(&self, error: RuntimeError) -> RuntimeError {
        let error = error.normalized();
        crate::debug!("queue"; "runtime error: {}", error.message);
        self.bus.publish(Event::RuntimeError(error.clone()));
        self.bus.publish(Event::DiagnoseRequest(error.clone()));
        error
    }

    /// Republish one console call from the preview.
    pub fn capture_console_log(&self, level: ConsoleLevel, args: &[&str], source: Option<&str>) {
        self.bus.publish(Event::ConsoleLog(ConsoleEntry {
            level,
            message: args.join(" "),
            source: source.map(str::to_string),
            timestamp: time::now_millis(),
        }));
    }

    pub fn pending(&self) -> Vec<PendingTask> {
        self.tasks
            .lock()
            .iter()
            .map(|t| PendingTask {
                path: t.path.clone(),
                priority: t.priority,
                sequence: t.sequence,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }

    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> QueueStats {
        *self.stats.lock()
    }

    /// Drop queued tasks, reporting each as cancelled. A running drain
    /// finishes its current task.
    pub fn clear(&self) {
        let dropped: Vec<BuildTask> = self.tasks.lock().drain(..).collect();
        if dropped.is_empty() {
            return;
        }

        self.stats.lock().cancelled += dropped.len() as u64;
        for task in dropped {
            task.token.cancel();
            self.bus.publish(Event::BuildCancelled { path: task.path });
        }
    }

    // -------------------------------------------------------------------------
    // Private
    // -------------------------------------------------------------------------

    fn pop(&self) -> Option<BuildTask> {
        let mut tasks = self.tasks.lock();
        if tasks.is_empty() {
            None
        } else {
            Some(tasks.remove(0))
        }
    }

    fn run(&self, task: BuildTask) {
        if task.token.is_cancelled() {
            self.stats.lock().cancelled += 1;
            self.bus.publish(Event::BuildCancelled { path: task.path });
            return;
        }

        let started = Instant::now();
        let outcome = guard(|| self.sink.dispatch(&task));
        let elapsed = started.elapsed();

        let failure = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(err)) => Some(format!("{err:#}")),
            Err(panic) => Some(format!("update panicked: {panic}")),
        };

        match failure {
            None => {
                self.stats.lock().succeeded += 1;
                self.bus.publish(Event::PreviewUpdate {
                    path: task.path.clone(),
                    priority: task.priority,
                });
            }
            Some(message) => {
                self.stats.lock().failed += 1;
                crate::log!("queue"; "update failed for {}: {}", task.path, message);
                self.handle_runtime_error(RuntimeError::new(message).with_source(&task.path));
            }
        }

        if !self.budget.is_zero() && elapsed > self.budget {
            self.stats.lock().slow += 1;
            self.bus.publish(Event::BuildSlow {
                path: task.path,
                elapsed_ms: elapsed.as_millis() as u64,
                budget_ms: self.budget.as_millis() as u64,
            });
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::Topic;

    /// Records dispatched paths; fails or panics on request.
    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<(String, Priority)>>,
    }

    impl TaskSink for Recorder {
        fn dispatch(&self, task: &BuildTask) -> anyhow::Result<()> {
            self.seen.lock().push((task.path.clone(), task.priority));
            if task.content == "fail" {
                anyhow::bail!("applier rejected {}", task.path);
            }
            if task.content == "panic" {
                panic!("applier crashed");
            }
            Ok(())
        }
    }

    fn setup() -> (EventBus, Arc<Recorder>, Arc<BuildQueue>) {
        crate::logger::set_quiet(true);
        let bus = EventBus::new();
        let sink = Arc::new(Recorder::default());
        let queue = Arc::new(BuildQueue::new(
            bus.clone(),
            Arc::clone(&sink) as Arc<dyn TaskSink>,
            &QueueConfig::default(),
        ));
        (bus, sink, queue)
    }

    fn collect(bus: &EventBus, topic: Topic) -> Arc<Mutex<Vec<Event>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        bus.subscribe(topic, move |e| sink.lock().push(e.clone()));
        events
    }

    #[test]
    fn equal_priorities_keep_arrival_order() {
        let (_, sink, queue) = setup();
        queue.enqueue("/lib/a.ts", "", Priority::Default);
        queue.enqueue("/first.ts", "", Priority::Entry);
        queue.enqueue("/components/c.tsx", "", Priority::Component);
        queue.enqueue("/second.ts", "", Priority::Entry);
        queue.drain();

        let order: Vec<u8> = sink.seen.lock().iter().map(|(_, p)| p.value()).collect();
        assert_eq!(order, vec![100, 100, 60, 20]);
        let paths: Vec<String> = sink.seen.lock().iter().map(|(p, _)| p.clone()).collect();
        assert_eq!(paths[0], "/first.ts");
        assert_eq!(paths[1], "/second.ts");
    }

    #[test]
    fn live_update_drains_immediately() {
        let (bus, sink, queue) = setup();
        let updates = collect(&bus, Topic::PreviewUpdate);

        queue.live_update("/src/index.ts", "ok");
        assert!(queue.is_empty());
        assert!(!queue.is_draining());
        assert_eq!(sink.seen.lock().len(), 1);
        assert_eq!(updates.lock().len(), 1);
    }

    #[test]
    fn tasks_added_mid_drain_are_processed() {
        let (bus, _, queue) = setup();
        let seen = Arc::new(Mutex::new(Vec::new()));

        // re-enqueue a follow-up from inside the drain via the bus
        let inner = Arc::downgrade(&queue);
        bus.subscribe(Topic::PreviewUpdate, move |e| {
            if let Event::PreviewUpdate { path, .. } = e
                && path == "/src/index.ts"
                && let Some(queue) = inner.upgrade()
            {
                queue.live_update("/styles/late.css", "ok");
            }
        });
        let sink = Arc::clone(&seen);
        bus.subscribe(Topic::PreviewUpdate, move |e| {
            if let Event::PreviewUpdate { path, .. } = e {
                sink.lock().push(path.clone());
            }
        });

        queue.live_update("/src/index.ts", "ok");
        assert_eq!(*seen.lock(), vec!["/src/index.ts", "/styles/late.css"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn failure_is_reported_and_loop_continues() {
        let (bus, sink, queue) = setup();
        let errors = collect(&bus, Topic::RuntimeError);
        let diagnose = collect(&bus, Topic::DiagnoseRequest);

        queue.enqueue("/src/index.ts", "fail", Priority::Entry);
        queue.enqueue("/src/App.tsx", "panic", Priority::Entry);
        queue.enqueue("/src/util.ts", "ok", Priority::Default);
        queue.drain();

        assert_eq!(sink.seen.lock().len(), 3);
        let errors = errors.lock();
        assert_eq!(errors.len(), 2);
        match &errors[0] {
            Event::RuntimeError(err) => {
                assert_eq!(err.source.as_deref(), Some("/src/index.ts"));
                assert!(err.message.contains("applier rejected"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(diagnose.lock().len(), 2);

        let stats = queue.stats();
        assert_eq!((stats.succeeded, stats.failed), (1, 2));
    }

    #[test]
    fn cancelled_tasks_report_cancellation() {
        let (bus, sink, queue) = setup();
        let cancelled = collect(&bus, Topic::BuildCancelled);
        let updates = collect(&bus, Topic::PreviewUpdate);

        let token = queue.enqueue("/a.ts", "ok", Priority::Default);
        queue.enqueue("/b.ts", "ok", Priority::Default);
        token.cancel();
        assert_eq!(queue.cancel("/b.ts"), 1);
        queue.drain();

        assert!(sink.seen.lock().is_empty());
        assert_eq!(cancelled.lock().len(), 2);
        assert!(updates.lock().is_empty());
    }

    #[test]
    fn slow_tasks_are_flagged() {
        struct Sleepy;
        impl TaskSink for Sleepy {
            fn dispatch(&self, _: &BuildTask) -> anyhow::Result<()> {
                std::thread::sleep(Duration::from_millis(5));
                Ok(())
            }
        }

        let bus = EventBus::new();
        let slow = collect(&bus, Topic::BuildSlow);
        let config = QueueConfig {
            task_budget_ms: 1,
            ..QueueConfig::default()
        };
        let queue = BuildQueue::new(bus, Arc::new(Sleepy), &config);
        queue.live_update("/a.ts", "");

        assert_eq!(slow.lock().len(), 1);
        assert_eq!(queue.stats().slow, 1);
    }

    #[test]
    fn console_log_is_republished() {
        let (bus, _, queue) = setup();
        let logs = collect(&bus, Topic::ConsoleLog);
        queue.capture_console_log(ConsoleLevel::Warn, &["value", "42"], Some("/a.ts"));

        match &logs.lock()[0] {
            Event::ConsoleLog(entry) => {
                assert_eq!(entry.level, ConsoleLevel::Warn);
                assert_eq!(entry.message, "value 42");
                assert_eq!(entry.source.as_deref(), Some("/a.ts"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn clear_cancels_pending() {
        let (_, _, queue) = setup();
        let token = queue.enqueue("/a.ts", "", Priority::Default);
        queue.clear();
        assert!(queue.is_empty());
        assert!(token.is_cancelled());
    }

    #[test]
    fn cleared_tasks_report_cancellation_once() {
        let (bus, sink, queue) = setup();
        let cancelled = collect(&bus, Topic::BuildCancelled);
        let updates = collect(&bus, Topic::PreviewUpdate);
        let errors = collect(&bus, Topic::RuntimeError);

        queue.enqueue("/a.ts", "ok", Priority::Default);
        queue.enqueue("/b.ts", "ok", Priority::Entry);
        queue.clear();
        queue.drain();

        assert!(sink.seen.lock().is_empty());
        assert!(updates.lock().is_empty());
        assert!(errors.lock().is_empty());
        let paths: Vec<String> = cancelled
            .lock()
            .iter()
            .filter_map(|e| match e {
                Event::BuildCancelled { path } => Some(path.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(paths, vec!["/b.ts", "/a.ts"]);
        assert_eq!(queue.stats().cancelled, 2);
    }
}
